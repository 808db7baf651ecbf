//! Loads raw subject/body text from template storage

use lazy_static::lazy_static;
use regex::Regex;

use crate::store::{ColumnSet, Condition, DataStore, Query};

use super::quote::normalize_quotes;
use super::types::{RawTemplate, TemplateError, TemplateResult, TemplateSource};

/// Entity holding shared templates, looked up by title
pub const TEMPLATE_ENTITY: &str = "template";
/// Entity holding per-user templates
pub const USER_TEMPLATE_ENTITY: &str = "ym_user_email_template";

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

lazy_static! {
    static ref CDATA_PATTERN: Regex = Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>").unwrap();
}

/// Text inside the first `<![CDATA[ ... ]]>` wrapper, or an empty string when
/// the field has none.
pub fn extract_cdata(text: &str) -> String {
    CDATA_PATTERN
        .find(text)
        .map(|m| {
            m.as_str()
                .trim_start_matches(CDATA_START)
                .trim_end_matches(CDATA_END)
                .to_string()
        })
        .unwrap_or_default()
}

/// Load the subject/body pair for `source`, quote-normalized.
///
/// # Errors
///
/// - `TemplateError::NotFound` when no template carries the name
/// - `TemplateError::Ambiguous` when several do
/// - `TemplateError::NoTemplateSource` when `source` is unset
/// - `TemplateError::Store` for store failures
pub fn load_template(store: &dyn DataStore, source: &TemplateSource) -> TemplateResult<RawTemplate> {
    let raw = match source {
        TemplateSource::Named(name) => load_named(store, name)?,
        TemplateSource::User(id) => {
            let record = store.retrieve(
                USER_TEMPLATE_ENTITY,
                *id,
                &ColumnSet::of(["ym_clean_template", "ym_clean_subject"]),
            )?;
            RawTemplate {
                subject: record.text("ym_clean_subject").unwrap_or_default().to_string(),
                body: record.text("ym_clean_template").unwrap_or_default().to_string(),
            }
        }
        TemplateSource::Unset => return Err(TemplateError::NoTemplateSource),
    };

    Ok(RawTemplate {
        subject: normalize_quotes(&raw.subject),
        body: normalize_quotes(&raw.body),
    })
}

fn load_named(store: &dyn DataStore, name: &str) -> TemplateResult<RawTemplate> {
    let query = Query::new(TEMPLATE_ENTITY)
        .columns(ColumnSet::of(["subject", "body"]))
        .condition(Condition::equal("title", name));

    let mut found = store.retrieve_multiple(&query)?;
    let template = match found.len() {
        0 => return Err(TemplateError::NotFound(name.to_string())),
        1 => found.remove(0),
        count => {
            return Err(TemplateError::Ambiguous {
                name: name.to_string(),
                count,
            })
        }
    };

    tracing::debug!(template = %name, id = %template.id, "Loaded named template");

    Ok(RawTemplate {
        subject: extract_cdata(template.text("subject").unwrap_or_default()),
        body: extract_cdata(template.text("body").unwrap_or_default()),
    })
}
