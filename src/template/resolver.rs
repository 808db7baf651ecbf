//! Field path resolution against records

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};

use crate::store::{
    AttributeKind, ColumnSet, DataStore, EntityMetadata, EntityReference, FieldValue, Record,
    StoreResult,
};

use super::option_cache::OptionLabelCache;

/// Display format for date/time values
pub const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Fields with this prefix belong to custom entities whose display name lives
/// in `ym_name` instead of `name`
const VENDOR_PREFIX: &str = "ym_";

/// Whole-hour offset of the server's local time zone
pub fn local_offset_hours() -> i32 {
    Local::now().offset().local_minus_utc() / 3600
}

/// Turns `field.path` strings into display text for a record.
///
/// Data gaps (absent field, null, unset reference, deleted related record,
/// unknown option code, unparsable date) resolve to an empty string. Only
/// store failures other than "not found" are returned as errors.
pub struct FieldResolver<'a> {
    store: &'a dyn DataStore,
    options: OptionLabelCache,
    metadata: HashMap<String, EntityMetadata>,
    utc_offset_hours: i32,
}

impl<'a> FieldResolver<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self {
            store,
            options: OptionLabelCache::new(),
            metadata: HashMap::new(),
            utc_offset_hours: local_offset_hours(),
        }
    }

    /// Override the hour shift applied to date values
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    pub fn store(&self) -> &'a dyn DataStore {
        self.store
    }

    pub fn option_cache(&self) -> &OptionLabelCache {
        &self.options
    }

    /// Resolve a possibly dotted field path against `record`.
    ///
    /// `a.b.c` follows reference `a`, then reference `b` on that record, and
    /// renders `c`.
    pub fn resolve(&mut self, path: &str, record: &Record) -> StoreResult<String> {
        let Some((head, rest)) = path.split_once('.') else {
            return self.leaf(path, record);
        };

        let Some(reference) = record.reference(head) else {
            tracing::debug!(
                entity = %record.entity,
                field = %head,
                "Path segment is not a populated reference"
            );
            return Ok(String::new());
        };

        let next_field = rest.split('.').next().unwrap_or(rest);
        let related = match self.store.retrieve(
            &reference.entity,
            reference.id,
            &ColumnSet::of([next_field]),
        ) {
            Ok(related) => related,
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    entity = %reference.entity,
                    id = %reference.id,
                    "Referenced record is missing"
                );
                return Ok(String::new());
            }
            Err(e) => return Err(e),
        };

        self.resolve(rest, &related)
    }

    fn leaf(&mut self, field: &str, record: &Record) -> StoreResult<String> {
        let Some(value) = record.get(field) else {
            return Ok(String::new());
        };

        match value {
            FieldValue::OptionSet(code) => {
                let store = self.store;
                let memo = &mut self.metadata;
                let label = self.options.label_for(&record.entity, field, *code, || {
                    cached_metadata(store, memo, &record.entity).cloned()
                })?;
                Ok(label.unwrap_or_default())
            }
            FieldValue::Reference(reference) => self.reference_name(field, reference),
            FieldValue::DateTime(_) => Ok(format_date(value, self.utc_offset_hours)),
            _ => {
                let meta = cached_metadata(self.store, &mut self.metadata, &record.entity)?;
                match meta.find(field).map(|a| &a.kind) {
                    Some(AttributeKind::Text { format: Some(format) })
                        if format.eq_ignore_ascii_case("url") =>
                    {
                        Ok(url_anchor(&value.to_string()))
                    }
                    Some(AttributeKind::DateTime) => Ok(format_date(value, self.utc_offset_hours)),
                    _ => Ok(value.to_string()),
                }
            }
        }
    }

    fn reference_name(&self, field: &str, reference: &EntityReference) -> StoreResult<String> {
        if let Some(name) = reference.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Ok(name.to_string());
        }

        let name_field = if field.starts_with(VENDOR_PREFIX) {
            "ym_name"
        } else {
            "name"
        };

        match self
            .store
            .retrieve(&reference.entity, reference.id, &ColumnSet::of([name_field]))
        {
            Ok(related) => Ok(related.get(name_field).map(|v| v.to_string()).unwrap_or_default()),
            Err(e) if e.is_not_found() => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}

fn cached_metadata<'m>(
    store: &dyn DataStore,
    memo: &'m mut HashMap<String, EntityMetadata>,
    entity: &str,
) -> StoreResult<&'m EntityMetadata> {
    if !memo.contains_key(entity) {
        let meta = store.entity_metadata(entity)?;
        memo.insert(entity.to_string(), meta);
    }
    Ok(&memo[entity])
}

/// Self-linking anchor for URL-formatted text; blank stays blank
fn url_anchor(url: &str) -> String {
    if url.trim().is_empty() {
        String::new()
    } else {
        format!("<a href='{}'>{}</a>", url, url)
    }
}

/// Render a date value shifted by `offset_hours`, or an empty string when the
/// value is not a date or the shift leaves the representable range.
pub fn format_date(value: &FieldValue, offset_hours: i32) -> String {
    let parsed = match value {
        FieldValue::DateTime(dt) => Some(*dt),
        FieldValue::Text(s) => parse_date(s),
        _ => None,
    };

    parsed
        .and_then(|dt| dt.checked_add_signed(Duration::hours(offset_hours.into())))
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
