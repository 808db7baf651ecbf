//! Placeholder expansion.
//!
//! Directives are dispatched by prefix, first match wins:
//!
//! | Directive | Output |
//! |-----------|--------|
//! | `REF_RECORD_URL_<field>\|text` | link to the record `field` references; left as-is when unset |
//! | `RECORD_URL\|text` | link to the current record |
//! | `RELATED_<entity>-<fk>-<f1>-<f2>...` | `<ul>` with one `<li>` per related record |
//! | anything else | field path resolved against the current record |
//!
//! Substitution replaces every occurrence of the exact placeholder text, so
//! identical placeholders always render identically within one pass.

use crate::metrics::RenderMetrics;
use crate::store::{Record, StoreResult, UrlFormatter};

use super::related::{projected_columns, RelatedQueries};
use super::resolver::FieldResolver;
use super::scanner::{directive, scan, wrap};

const REF_RECORD_URL: &str = "REF_RECORD_URL";
const REF_RECORD_URL_PREFIX: &str = "REF_RECORD_URL_";
const RECORD_URL: &str = "RECORD_URL";
const RELATED: &str = "RELATED";
const RELATED_PREFIX: &str = "RELATED_";

/// Default bound on nested RELATED expansion
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Parsed form of a placeholder directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'d> {
    RefRecordLink { field: &'d str, text: &'d str },
    RecordLink { text: &'d str },
    Related {
        entity: &'d str,
        fk_field: &'d str,
        segments: Vec<&'d str>,
    },
    /// RELATED directive without an entity and foreign key
    MalformedRelated,
    FieldRef(&'d str),
}

impl<'d> Directive<'d> {
    pub fn parse(directive: &'d str) -> Self {
        if directive.starts_with(REF_RECORD_URL) {
            let (left, text) = split_link(directive);
            let field = left.strip_prefix(REF_RECORD_URL_PREFIX).unwrap_or("");
            return Directive::RefRecordLink { field, text };
        }

        if directive.starts_with(RECORD_URL) {
            let (_, text) = split_link(directive);
            return Directive::RecordLink { text };
        }

        if directive.starts_with(RELATED) {
            let spec = directive
                .strip_prefix(RELATED_PREFIX)
                .unwrap_or(&directive[RELATED.len()..]);
            let mut parts = spec.split('-');
            return match (parts.next(), parts.next()) {
                (Some(entity), Some(fk_field)) if !entity.is_empty() && !fk_field.is_empty() => {
                    Directive::Related {
                        entity,
                        fk_field,
                        segments: parts.collect(),
                    }
                }
                _ => Directive::MalformedRelated,
            };
        }

        Directive::FieldRef(directive)
    }

    fn kind(&self) -> &'static str {
        match self {
            Directive::RefRecordLink { .. } => "ref_record_url",
            Directive::RecordLink { .. } => "record_url",
            Directive::Related { .. } | Directive::MalformedRelated => "related",
            Directive::FieldRef(_) => "field",
        }
    }
}

/// Left of the first `|`, right of the last `|`
fn split_link(directive: &str) -> (&str, &str) {
    let left = directive.split('|').next().unwrap_or(directive);
    let text = directive.rsplit('|').next().unwrap_or(directive);
    (left, text)
}

/// Anchor markup used for record links, padded with a space on both sides
pub fn link(url: &str, text: &str) -> String {
    format!(" <a href=\"{}\">{}</a> ", url, text)
}

/// Expands placeholders in text against a record.
pub struct Expander<'a> {
    resolver: FieldResolver<'a>,
    related: RelatedQueries,
    formatter: &'a dyn UrlFormatter,
    base_url: String,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    pub fn new(
        resolver: FieldResolver<'a>,
        formatter: &'a dyn UrlFormatter,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            related: RelatedQueries::new(),
            formatter,
            base_url: base_url.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_formatter(mut self, formatter: &'a dyn UrlFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.resolver = self.resolver.with_utc_offset_hours(hours);
        self
    }

    pub fn related_mut(&mut self) -> &mut RelatedQueries {
        &mut self.related
    }

    pub fn resolver(&self) -> &FieldResolver<'a> {
        &self.resolver
    }

    /// Replace every placeholder in `text` with content resolved from `record`.
    pub fn expand(&mut self, text: &str, record: &Record) -> StoreResult<String> {
        self.expand_at(text, record, 0)
    }

    fn expand_at(&mut self, text: &str, record: &Record, depth: usize) -> StoreResult<String> {
        let mut result = text.to_string();

        for placeholder in scan(text) {
            let cleaned = directive(placeholder);
            let parsed = Directive::parse(&cleaned);

            let Some(replacement) = self.render(&parsed, record, depth)? else {
                RenderMetrics::record_unresolved();
                tracing::debug!(placeholder = %placeholder, "Placeholder left unresolved");
                continue;
            };

            RenderMetrics::record_placeholder(parsed.kind());
            tracing::trace!(
                placeholder = %placeholder,
                replacement = %replacement,
                "Placeholder resolved"
            );
            result = result.replace(placeholder, &replacement);
        }

        Ok(result)
    }

    /// Replacement text for one directive; `None` keeps the placeholder.
    fn render(
        &mut self,
        directive: &Directive<'_>,
        record: &Record,
        depth: usize,
    ) -> StoreResult<Option<String>> {
        let rendered = match directive {
            Directive::RefRecordLink { field, text } => {
                if field.trim().is_empty() {
                    return Ok(None);
                }
                match record.reference(field) {
                    Some(target) => {
                        let url = self
                            .formatter
                            .record_url(&self.base_url, &target.entity, target.id);
                        link(&url, text)
                    }
                    None => return Ok(None),
                }
            }
            Directive::RecordLink { text } => {
                let url = self
                    .formatter
                    .record_url(&self.base_url, &record.entity, record.id);
                link(&url, text)
            }
            Directive::Related {
                entity,
                fk_field,
                segments,
            } => {
                if depth >= self.max_depth {
                    tracing::warn!(
                        entity = %entity,
                        depth = depth,
                        "RELATED expansion exceeds maximum depth"
                    );
                    String::new()
                } else {
                    self.expand_related(entity, fk_field, segments, record, depth)?
                }
            }
            Directive::MalformedRelated => {
                tracing::warn!(record = %record.id, "RELATED directive needs an entity and a foreign key");
                String::new()
            }
            Directive::FieldRef(path) => self.resolver.resolve(path, record)?,
        };

        Ok(Some(rendered))
    }

    fn expand_related(
        &mut self,
        entity: &str,
        fk_field: &str,
        segments: &[&str],
        record: &Record,
        depth: usize,
    ) -> StoreResult<String> {
        let columns = projected_columns(segments);
        let query = self.related.build(entity, fk_field, record.id, &columns);
        let related = self.resolver.store().retrieve_multiple(&query)?;

        tracing::debug!(
            entity = %entity,
            fk_field = %fk_field,
            parent = %record.id,
            count = related.len(),
            "Expanding related records"
        );

        let item_template: String = segments.iter().map(|s| wrap(s)).collect();

        let mut list = String::from("<ul>");
        for related_record in &related {
            list.push_str("<li>");
            list.push_str(&self.expand_at(&item_template, related_record, depth + 1)?);
            list.push_str("</li>");
        }
        list.push_str("</ul>");

        Ok(list)
    }
}
