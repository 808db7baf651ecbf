//! Data store capabilities consumed by the template engine.
//!
//! This module provides:
//! - Record, metadata and query types
//! - The blocking [`DataStore`] and [`UrlFormatter`] traits
//! - [`MemoryStore`], a DashMap-backed store seeded from JSON

mod backend;
mod memory;
mod types;

pub use backend::{DataStore, PathUrlFormatter, StoreError, StoreResult, UrlFormatter};
pub use memory::{MemoryStore, StoreSeed};
pub use types::{
    AttributeKind, AttributeMetadata, ColumnSet, Condition, ConditionOperator, EntityMetadata,
    EntityReference, FieldValue, OptionMetadata, Query, Record,
};
