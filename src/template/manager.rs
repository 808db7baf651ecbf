//! Public entry point: load a template and fill it for a record

use std::collections::HashMap;
use std::time::Instant;

use uuid::Uuid;

use crate::metrics::RenderMetrics;
use crate::store::{ColumnSet, DataStore, EntityReference, PathUrlFormatter, Query, UrlFormatter};

use super::expander::Expander;
use super::loader::load_template;
use super::resolver::FieldResolver;
use super::types::{ResolvedEmail, TemplateResult, TemplateSource};

/// Replace `&;token;&` (and its HTML-escaped form `&amp;;token;&amp;`) with
/// the caller-supplied value.
pub fn apply_substitutions(text: &str, substitutions: &HashMap<String, String>) -> String {
    let mut result = text.to_string();
    for (token, value) in substitutions {
        result = result.replace(&format!("&;{};&", token), value);
        result = result.replace(&format!("&amp;;{};&amp;", token), value);
    }
    result
}

/// Fills one email template against records of a data store.
///
/// A manager holds per-session state (option label cache, related query
/// overrides) and is meant for one thread. The store is borrowed and must
/// outlive the manager.
///
/// # Example
///
/// ```ignore
/// let mut manager = TemplateManager::with_template_name(&store, "https://crm/", "Deal won");
/// manager.add_filter("task-deal_id", open_tasks_query);
/// let email = manager.fill_template(&deal_ref)?;
/// ```
pub struct TemplateManager<'a> {
    store: &'a dyn DataStore,
    source: TemplateSource,
    expander: Expander<'a>,
}

impl<'a> TemplateManager<'a> {
    pub fn new(store: &'a dyn DataStore, base_url: impl Into<String>, source: TemplateSource) -> Self {
        let formatter: &'a dyn UrlFormatter = &PathUrlFormatter;
        Self {
            store,
            source,
            expander: Expander::new(FieldResolver::new(store), formatter, base_url),
        }
    }

    /// Manager for a shared template looked up by title; a blank title
    /// leaves the source unset
    pub fn with_template_name(
        store: &'a dyn DataStore,
        base_url: impl Into<String>,
        template_name: impl AsRef<str>,
    ) -> Self {
        Self::new(store, base_url, TemplateSource::select(Some(template_name.as_ref()), None))
    }

    /// Manager for a per-user template record
    pub fn with_user_template(
        store: &'a dyn DataStore,
        base_url: impl Into<String>,
        user_template_id: Uuid,
    ) -> Self {
        Self::new(store, base_url, TemplateSource::User(user_template_id))
    }

    pub fn with_url_formatter(mut self, formatter: &'a dyn UrlFormatter) -> Self {
        self.expander = self.expander.with_formatter(formatter);
        self
    }

    /// Hour shift for date values; defaults to the server's local offset
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.expander = self.expander.with_utc_offset_hours(hours);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.expander = self.expander.with_max_depth(max_depth);
        self
    }

    /// Use `query` for RELATED expansions keyed `"<entity>-<fk_field>"`.
    pub fn add_filter(&mut self, key: impl Into<String>, query: Query) {
        self.expander.related_mut().add_filter(key, query);
    }

    /// Number of option sets cached so far in this session
    pub fn cached_option_sets(&self) -> usize {
        self.expander.resolver().option_cache().len()
    }

    /// Template text without any record-bound resolution
    pub fn fill_raw_template(&self) -> TemplateResult<ResolvedEmail> {
        Ok(load_template(self.store, &self.source)?.into())
    }

    /// Fill subject and body against the referenced record.
    ///
    /// # Errors
    ///
    /// Fails when the template cannot be loaded, the record does not exist,
    /// or the store fails. Missing data inside the record never fails.
    #[tracing::instrument(
        name = "template.fill",
        skip(self, record),
        fields(entity = %record.entity, id = %record.id)
    )]
    pub fn fill_template(&mut self, record: &EntityReference) -> TemplateResult<ResolvedEmail> {
        let started = Instant::now();

        let result = self.fill(record);
        match &result {
            Ok(_) => {
                RenderMetrics::record_success(started.elapsed());
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Template filled"
                );
            }
            Err(e) => {
                RenderMetrics::record_failure();
                tracing::warn!(error = %e, "Template fill failed");
            }
        }

        result
    }

    /// [`fill_template`](Self::fill_template), then replace `&;token;&`
    /// tokens in subject and body.
    pub fn fill_template_with(
        &mut self,
        record: &EntityReference,
        substitutions: &HashMap<String, String>,
    ) -> TemplateResult<ResolvedEmail> {
        let email = self.fill_template(record)?;
        Ok(ResolvedEmail {
            subject: apply_substitutions(&email.subject, substitutions),
            body: apply_substitutions(&email.body, substitutions),
        })
    }

    fn fill(&mut self, reference: &EntityReference) -> TemplateResult<ResolvedEmail> {
        let record = self
            .store
            .retrieve(&reference.entity, reference.id, &ColumnSet::All)?;
        let raw = load_template(self.store, &self.source)?;

        Ok(ResolvedEmail {
            subject: self.expander.expand(&raw.subject, &record)?,
            body: self.expander.expand(&raw.body, &record)?,
        })
    }
}
