//! Template render endpoint.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::store::{EntityReference, Query};
use crate::template::{ResolvedEmail, TemplateManager, TemplateSource};

/// Request body of `POST /api/v1/render`
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Title of a shared template; wins over `user_template_id`
    pub template_name: Option<String>,

    /// Id of a per-user template record
    pub user_template_id: Option<Uuid>,

    /// Record to resolve placeholders against; omit for the raw template
    pub record: Option<EntityReference>,

    /// `&;token;&` replacements applied after placeholder expansion
    #[serde(default)]
    pub substitutions: HashMap<String, String>,

    /// Related query overrides keyed `"<entity>-<fk_field>"`
    #[serde(default)]
    pub filters: HashMap<String, Query>,
}

/// POST /api/v1/render - Fill a template
#[tracing::instrument(
    name = "http.render_template",
    skip(state, request),
    fields(template = ?request.template_name, user_template = ?request.user_template_id)
)]
pub async fn render_template(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<ResolvedEmail>> {
    // The engine blocks on every store call
    let email = tokio::task::spawn_blocking(move || render_blocking(&state, request))
        .await
        .map_err(|e| AppError::Internal(format!("Render task failed: {}", e)))??;

    Ok(Json(email))
}

/// Run one render with a fresh `TemplateManager`
pub fn render_blocking(state: &AppState, request: RenderRequest) -> Result<ResolvedEmail> {
    let source = TemplateSource::select(request.template_name.as_deref(), request.user_template_id);
    let render = &state.settings.render;

    let mut manager = TemplateManager::new(state.store.as_ref(), render.base_url.clone(), source)
        .with_url_formatter(state.url_formatter.as_ref())
        .with_max_depth(render.max_expansion_depth);
    if let Some(hours) = render.utc_offset_hours {
        manager = manager.with_utc_offset_hours(hours);
    }

    for (key, query) in request.filters {
        manager.add_filter(key, query);
    }

    let email = match &request.record {
        Some(record) if request.substitutions.is_empty() => manager.fill_template(record)?,
        Some(record) => manager.fill_template_with(record, &request.substitutions)?,
        None if !request.substitutions.is_empty() => {
            return Err(AppError::Validation(
                "substitutions require a record".to_string(),
            ))
        }
        None => manager.fill_raw_template()?,
    };

    Ok(email)
}
