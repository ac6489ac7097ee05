//! Page preview handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use image::DynamicImage;
use serde::Deserialize;
use std::sync::Arc;

use crate::binding::{Binding, BindingContext, MetadataEntry};
use crate::render::{self, PageGeometry, PageLayout, RenderTarget, layout_page};
use crate::template::{Page, Template};

use super::super::state::AppState;
use super::{error_response, parse_page};

/// Request body for preview and layout endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub template: Template,
    /// Real data to bind. Without it fields show their sample values.
    #[serde(default)]
    pub context: Option<BindingContext>,
    #[serde(default)]
    pub course_metadata: Vec<MetadataEntry>,
    /// Surface width in pixels; the export resolution when absent.
    #[serde(default)]
    pub width: Option<u32>,
}

impl PreviewRequest {
    fn target(&self) -> RenderTarget {
        match self.width {
            Some(width) => RenderTarget::Screen { width },
            None => RenderTarget::Export,
        }
    }

    fn binding(&self) -> Binding<'_> {
        match &self.context {
            Some(context) => Binding::bound(context, &self.course_metadata),
            None => Binding::Sample,
        }
    }
}

async fn load_background(
    state: &AppState,
    template: &Template,
    page: Page,
) -> Result<Option<DynamicImage>, (StatusCode, String)> {
    let url = template.background(page);
    if url.trim().is_empty() {
        return Ok(None);
    }
    state
        .backgrounds
        .fetch(url)
        .await
        .map(Some)
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("Background unavailable: {}", e)))
}

/// POST /api/preview/:page - Render one page as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
    Json(req): Json<PreviewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let page = parse_page(&page)?;
    let template = req.template.clone().normalize();
    let background = load_background(&state, &template, page).await?;

    // Rasterizing can take a while at export resolution
    let png = tokio::task::spawn_blocking(move || {
        render::render_page_png(
            &template,
            &req.binding(),
            page,
            req.target(),
            background.as_ref(),
            &state.fonts,
            &state.config,
        )
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e)))?
    .map_err(error_response)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// POST /api/layout/:page - Placed text for one page, for clients that
/// draw fields themselves.
pub async fn layout(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PageLayout>, (StatusCode, String)> {
    let page = parse_page(&page)?;
    let template = req.template.clone().normalize();
    let background = load_background(&state, &template, page).await?;
    let geometry = PageGeometry::for_background(&state.config, background.as_ref());

    Ok(Json(layout_page(
        &template,
        &req.binding(),
        page,
        req.target(),
        geometry,
        &state.config,
    )))
}
