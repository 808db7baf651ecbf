//! Email template placeholder engine.
//!
//! This module provides:
//! - Template loading from named or per-user template records
//! - Placeholder scanning (`%;directive;%`)
//! - Field path resolution with reference traversal, option set labels,
//!   URL and date formatting
//! - RELATED expansion of one-to-many relations into HTML lists
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::load("seed.json")?;
//!
//! let mut manager = TemplateManager::with_template_name(&store, "https://crm/", "Deal won");
//! let email = manager.fill_template(&EntityReference::new("deal", deal_id))?;
//!
//! // "Hello %;customer.name;%" -> "Hello Acme"
//! println!("{}\n\n{}", email.subject, email.body);
//! ```

mod expander;
mod loader;
mod manager;
mod option_cache;
mod quote;
mod related;
mod resolver;
mod scanner;
mod types;

#[cfg(test)]
mod test_support;

pub use expander::{Directive, Expander, DEFAULT_MAX_DEPTH};
pub use loader::{extract_cdata, load_template, TEMPLATE_ENTITY, USER_TEMPLATE_ENTITY};
pub use manager::{apply_substitutions, TemplateManager};
pub use option_cache::OptionLabelCache;
pub use quote::normalize_quotes;
pub use related::{filter_key, RelatedQueries};
pub use resolver::{format_date, local_offset_hours, FieldResolver};
pub use scanner::scan;
pub use types::{RawTemplate, ResolvedEmail, TemplateError, TemplateResult, TemplateSource};
