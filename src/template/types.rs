//! Template types and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template name is ambiguous: {name} ({count} matches)")]
    Ambiguous { name: String, count: usize },

    #[error("Can't find template: neither a template name nor a user template id was supplied")]
    NoTemplateSource,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Where the subject/body text comes from
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSource {
    /// Shared template looked up by its title
    Named(String),
    /// Per-user template record
    User(Uuid),
    /// Nothing configured; loading fails
    Unset,
}

impl TemplateSource {
    /// Pick the source the way callers supply it: a non-blank name wins over
    /// a user template id.
    pub fn select(name: Option<&str>, user_template_id: Option<Uuid>) -> Self {
        match (name.map(str::trim).filter(|n| !n.is_empty()), user_template_id) {
            (Some(name), _) => TemplateSource::Named(name.to_string()),
            (None, Some(id)) => TemplateSource::User(id),
            (None, None) => TemplateSource::Unset,
        }
    }
}

/// Raw subject/body pair as loaded from storage
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTemplate {
    pub subject: String,
    pub body: String,
}

/// A resolved email ready for the sending transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEmail {
    pub subject: String,
    pub body: String,
}

impl From<RawTemplate> for ResolvedEmail {
    fn from(raw: RawTemplate) -> Self {
        Self {
            subject: raw.subject,
            body: raw.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_wins_over_user_template() {
        let id = Uuid::new_v4();
        assert_eq!(
            TemplateSource::select(Some("Welcome"), Some(id)),
            TemplateSource::Named("Welcome".to_string())
        );
    }

    #[test]
    fn test_blank_name_falls_back_to_user_template() {
        let id = Uuid::new_v4();
        assert_eq!(TemplateSource::select(Some("  "), Some(id)), TemplateSource::User(id));
        assert_eq!(TemplateSource::select(None, None), TemplateSource::Unset);
    }
}
