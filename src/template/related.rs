//! Queries for one-to-many related records

use std::collections::HashMap;

use uuid::Uuid;

use crate::store::{ColumnSet, Condition, FieldValue, Query};

/// Field prefixes that mark a RELATED segment as a column to fetch
pub const PROJECTED_PREFIXES: [&str; 2] = ["ym_", "kc_"];

/// Key under which an override query is registered: `"<entity>-<fk_field>"`
pub fn filter_key(entity: &str, fk_field: &str) -> String {
    format!("{}-{}", entity, fk_field)
}

/// Columns fetched for a set of RELATED segments.
///
/// Only segments with a custom field prefix are fetched. A dotted segment
/// fetches its first hop.
pub fn projected_columns<'s>(segments: &[&'s str]) -> Vec<&'s str> {
    let mut columns: Vec<&str> = Vec::new();
    for segment in segments {
        if !PROJECTED_PREFIXES.iter().any(|p| segment.starts_with(p)) {
            continue;
        }
        let column = segment.split('.').next().unwrap_or(segment);
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    columns
}

/// Builds related-record queries, honoring caller-registered overrides.
#[derive(Debug, Default, Clone)]
pub struct RelatedQueries {
    overrides: HashMap<String, Query>,
}

impl RelatedQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override for `key`; a later registration replaces it.
    pub fn add_filter(&mut self, key: impl Into<String>, query: Query) {
        let key = key.into();
        tracing::debug!(key = %key, entity = %query.entity, "Registered related query override");
        self.overrides.insert(key, query);
    }

    /// Query selecting `entity` records whose `fk_field` points at `parent_id`.
    ///
    /// A registered override is used instead of the default equality filter;
    /// its column set is replaced by `columns` every time.
    pub fn build(&mut self, entity: &str, fk_field: &str, parent_id: Uuid, columns: &[&str]) -> Query {
        let columns = ColumnSet::of(columns.iter().copied());

        if let Some(query) = self.overrides.get_mut(&filter_key(entity, fk_field)) {
            query.columns = columns;
            return query.clone();
        }

        Query::new(entity)
            .columns(columns)
            .condition(Condition::equal(fk_field, FieldValue::Id(parent_id)))
    }
}
