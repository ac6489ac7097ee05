//! Template document handlers.

use axum::{Json, http::StatusCode};
use serde::Deserialize;

use crate::editor::{HoursMode, reconcile_hours};
use crate::template::{Template, default_template};

/// GET /api/templates/default - Seed template for a course without one.
pub async fn default() -> Json<Template> {
    Json(default_template())
}

/// POST /api/templates/normalize - Bring a stored document (any shape) into
/// canonical form, with the legacy `bgImage` alias written back.
pub async fn normalize(
    Json(stored): Json<serde_json::Value>,
) -> Result<Json<Template>, (StatusCode, String)> {
    let template = Template::from_value(&stored).normalize();
    template
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    Ok(Json(template))
}

/// Request body for the hours endpoint.
#[derive(Debug, Deserialize)]
pub struct HoursRequest {
    pub template: Template,
    pub mode: HoursMode,
}

/// POST /api/templates/hours - Reconcile the hours fields with a mode.
pub async fn hours(Json(req): Json<HoursRequest>) -> Json<Template> {
    let mut template = req.template.normalize();
    reconcile_hours(&mut template, req.mode);
    Json(template)
}
