//! Capability traits for the external data store.
//!
//! The engine never talks to a concrete CRM. Everything it needs from the
//! outside world goes through [`DataStore`] (records and metadata) and
//! [`UrlFormatter`] (links to records).

use thiserror::Error;
use uuid::Uuid;

use super::types::{ColumnSet, EntityMetadata, Query, Record};

/// Errors surfaced by a data store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record does not exist
    #[error("Record not found: {entity}({id})")]
    NotFound { entity: String, id: Uuid },

    /// Store is unreachable or refused the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Data gaps the engine degrades to an empty string instead of failing on
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Blocking data store client.
///
/// Every call blocks until the store answers. Timeouts and retries are the
/// implementation's business; the engine propagates whatever error comes back.
pub trait DataStore: Send + Sync {
    /// Fetch one record limited to `columns`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when no record of that entity has `id`.
    fn retrieve(&self, entity: &str, id: Uuid, columns: &ColumnSet) -> StoreResult<Record>;

    /// Run a filtered query, returning matching records limited to the
    /// query's column set.
    fn retrieve_multiple(&self, query: &Query) -> StoreResult<Vec<Record>>;

    /// Attribute descriptors for an entity type.
    fn entity_metadata(&self, entity: &str) -> StoreResult<EntityMetadata>;
}

/// Builds the URL of a record page
pub trait UrlFormatter: Send + Sync {
    fn record_url(&self, base_url: &str, entity: &str, id: Uuid) -> String;
}

/// `{base}/{entity}/{id}` with a single slash between base and path
#[derive(Debug, Clone, Copy, Default)]
pub struct PathUrlFormatter;

impl UrlFormatter for PathUrlFormatter {
    fn record_url(&self, base_url: &str, entity: &str, id: Uuid) -> String {
        format!("{}/{}/{}", base_url.trim_end_matches('/'), entity, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_formatter_trims_trailing_slash() {
        let id = Uuid::new_v4();
        assert_eq!(
            PathUrlFormatter.record_url("https://crm/", "deal", id),
            format!("https://crm/deal/{}", id)
        );
        assert_eq!(
            PathUrlFormatter.record_url("https://crm", "deal", id),
            format!("https://crm/deal/{}", id)
        );
    }
}
