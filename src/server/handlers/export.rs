//! Certificate export handler.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::binding::{BindingContext, MetadataEntry};
use crate::template::Template;

use super::super::state::AppState;
use super::error_response;

/// Request body for export.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub template: Template,
    #[serde(default)]
    pub context: BindingContext,
    #[serde(default)]
    pub course_metadata: Vec<MetadataEntry>,
}

/// POST /api/export - Two-page PDF for one credential.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let artifact = state
        .exporter
        .export(&req.template, &req.context, &req.course_metadata)
        .await
        .map_err(error_response)?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    ))
}
