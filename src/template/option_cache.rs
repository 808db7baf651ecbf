//! Memoized enumeration code -> label lookups

use std::collections::HashMap;

use crate::metrics::CacheMetrics;
use crate::store::{EntityMetadata, OptionMetadata, StoreResult};

/// Per-session cache of option set definitions.
///
/// Entries are keyed by `(entity, field)` and hold the field's complete list
/// of options, fetched from entity metadata on first use. Not shared between
/// threads; one instance belongs to one `TemplateManager`.
#[derive(Debug, Default)]
pub struct OptionLabelCache {
    entries: HashMap<(String, String), Vec<OptionMetadata>>,
}

impl OptionLabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for `code` of `entity.field`.
    ///
    /// `metadata` is only called when the field has not been seen before. A
    /// field without a picklist definition is cached as an empty option list,
    /// so every code on it resolves to `None`.
    pub fn label_for<F>(
        &mut self,
        entity: &str,
        field: &str,
        code: i32,
        metadata: F,
    ) -> StoreResult<Option<String>>
    where
        F: FnOnce() -> StoreResult<EntityMetadata>,
    {
        let key = (entity.to_string(), field.to_string());

        if self.entries.contains_key(&key) {
            CacheMetrics::record_hit();
        } else {
            CacheMetrics::record_miss();
            let meta = metadata()?;
            let options = meta.options(field).map(<[_]>::to_vec).unwrap_or_default();

            tracing::debug!(
                entity = %entity,
                field = %field,
                options = options.len(),
                "Cached option set"
            );

            self.entries.insert(key.clone(), options);
        }

        let options = &self.entries[&key];
        Ok(options
            .iter()
            .find(|o| o.value == code)
            .map(|o| o.label.clone()))
    }

    /// Number of cached option sets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::store::AttributeKind;

    fn deal_metadata() -> EntityMetadata {
        EntityMetadata::new("deal").attribute(
            "ym_stage",
            AttributeKind::Picklist {
                options: vec![
                    OptionMetadata { value: 1, label: "Open".into() },
                    OptionMetadata { value: 2, label: "Won".into() },
                ],
            },
        )
    }

    #[test]
    fn test_metadata_fetched_once_per_field() {
        let mut cache = OptionLabelCache::new();
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok(deal_metadata())
        };

        assert_eq!(cache.label_for("deal", "ym_stage", 1, fetch).unwrap().as_deref(), Some("Open"));
        assert_eq!(cache.label_for("deal", "ym_stage", 2, fetch).unwrap().as_deref(), Some("Won"));
        assert_eq!(cache.label_for("deal", "ym_stage", 9, fetch).unwrap(), None);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_field_name_on_other_entity_is_separate() {
        let mut cache = OptionLabelCache::new();
        cache
            .label_for("deal", "ym_stage", 1, || Ok(deal_metadata()))
            .unwrap();

        let lead = EntityMetadata::new("lead").attribute(
            "ym_stage",
            AttributeKind::Picklist {
                options: vec![OptionMetadata { value: 1, label: "New".into() }],
            },
        );
        let label = cache.label_for("lead", "ym_stage", 1, || Ok(lead)).unwrap();
        assert_eq!(label.as_deref(), Some("New"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_non_picklist_field_has_no_labels() {
        let mut cache = OptionLabelCache::new();
        let label = cache
            .label_for("deal", "ym_missing", 1, || Ok(deal_metadata()))
            .unwrap();
        assert_eq!(label, None);
    }
}
