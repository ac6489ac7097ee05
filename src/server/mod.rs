//! # HTTP Service for Certificate Templates
//!
//! Thin HTTP surface over the library: template normalization, page
//! previews, background uploads and PDF export.
//!
//! ## Usage
//!
//! ```bash
//! diploma serve --listen 0.0.0.0:8080 --uploads ./uploads --fonts ./fonts
//! ```
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/api/templates/default` | | template JSON |
//! | POST | `/api/templates/normalize` | stored JSON | template JSON |
//! | POST | `/api/templates/hours` | `{template, mode}` | template JSON |
//! | POST | `/api/preview/:page` | `{template, context?, courseMetadata?, width?}` | PNG |
//! | POST | `/api/layout/:page` | same as preview | layout JSON |
//! | POST | `/api/export` | `{template, context, courseMetadata?}` | PDF |
//! | POST | `/api/backgrounds/:page` | multipart `file` | `{page, url}` |
//! | GET | `/uploads/*` | | stored backgrounds |

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::DiplomaError;

/// Multipart framing allowance on top of the upload limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the router for a prepared state.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;
    let public_base = state.config.public_base_url.trim_end_matches('/').to_string();
    let uploads_dir = state.config.uploads_dir.clone();

    let mut app = Router::new()
        // Templates
        .route("/api/templates/default", get(handlers::templates::default))
        .route("/api/templates/normalize", post(handlers::templates::normalize))
        .route("/api/templates/hours", post(handlers::templates::hours))
        // Rendering
        .route("/api/preview/:page", post(handlers::preview::preview))
        .route("/api/layout/:page", post(handlers::preview::layout))
        .route("/api/export", post(handlers::export::export))
        // Uploads
        .route(
            "/api/backgrounds/:page",
            post(handlers::backgrounds::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state);

    // Serve stored backgrounds when they live under a local path prefix
    if public_base.starts_with('/') && public_base.len() > 1 {
        app = app.nest_service(&public_base, ServeDir::new(uploads_dir));
    }

    app.layer(TraceLayer::new_for_http())
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use diploma::config::Config;
/// use diploma::server::serve;
///
/// # async fn example() -> Result<(), diploma::DiplomaError> {
/// serve(Config::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: Config) -> Result<(), DiplomaError> {
    config.validate()?;
    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| DiplomaError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    tracing::info!(
        addr = %listen_addr,
        uploads = %state.config.uploads_dir.display(),
        "diploma HTTP server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| DiplomaError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::BackgroundSource;
    use crate::render::fonts::FontBook;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use image::DynamicImage;
    use tower::ServiceExt;

    struct NoBackgrounds;

    #[async_trait]
    impl BackgroundSource for NoBackgrounds {
        async fn fetch(&self, url: &str) -> Result<DynamicImage, DiplomaError> {
            Err(DiplomaError::Transport(format!("unreachable: {}", url)))
        }
    }

    fn app(dir: &std::path::Path) -> Router {
        let config = Config {
            uploads_dir: dir.to_path_buf(),
            ..Config::default()
        };
        let state = AppState::with_parts(
            config,
            Arc::new(FontBook::bitmap_only()),
            Arc::new(NoBackgrounds),
        );
        router(Arc::new(state))
    }

    async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_template_has_alias() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(dir.path())
            .oneshot(Request::get("/api/templates/default").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(v["bgImage"], v["bgImageFront"]);
        assert_eq!(v["fields"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_normalize_legacy_document() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(dir.path())
            .oneshot(post_json(
                "/api/templates/normalize",
                serde_json::json!({
                    "bgImage": "/uploads/a.png",
                    "fields": [{"id": "studentName", "label": "Nombre", "x": 50, "y": 40}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(v["bgImageFront"], "/uploads/a.png");
        assert_eq!(v["fields"][0]["page"], "front");
    }

    #[tokio::test]
    async fn test_preview_png() {
        let dir = tempfile::tempdir().unwrap();
        let template = serde_json::to_value(crate::template::default_template()).unwrap();
        let resp = app(dir.path())
            .oneshot(post_json(
                "/api/preview/back",
                serde_json::json!({ "template": template, "width": 400 }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        let png = body_bytes(resp).await;
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), 400);
    }

    #[tokio::test]
    async fn test_preview_defaults_to_export_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let template = serde_json::to_value(crate::template::default_template()).unwrap();
        let resp = app(dir.path())
            .oneshot(post_json(
                "/api/preview/front",
                serde_json::json!({ "template": template }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let img = image::load_from_memory(&body_bytes(resp).await).unwrap();
        assert_eq!((img.width(), img.height()), (2246, 1588));
    }

    #[tokio::test]
    async fn test_preview_width_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let template = serde_json::to_value(crate::template::default_template()).unwrap();
        let resp = app(dir.path())
            .oneshot(post_json(
                "/api/preview/front",
                serde_json::json!({ "template": template, "width": u32::MAX }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let img = image::load_from_memory(&body_bytes(resp).await).unwrap();
        assert_eq!(img.width(), 2246);
    }

    #[tokio::test]
    async fn test_preview_refuses_paths_outside_uploads() {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        image::RgbImage::new(4, 4)
            .save_with_format(root.path().join("secret.png"), image::ImageFormat::Png)
            .unwrap();
        let config = Config {
            uploads_dir: uploads.clone(),
            ..Config::default()
        };
        let state = AppState::new(config).unwrap();
        let resp = router(Arc::new(state))
            .oneshot(post_json(
                "/api/preview/front",
                serde_json::json!({
                    "template": { "bgImageFront": "/uploads/../secret.png", "fields": [] },
                    "width": 100
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unknown_page_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(dir.path())
            .oneshot(post_json(
                "/api/preview/inside",
                serde_json::json!({ "template": {} }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_with_unreachable_background_is_502() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(dir.path())
            .oneshot(post_json(
                "/api/export",
                serde_json::json!({
                    "template": { "bgImageFront": "https://cdn.test/front.png", "fields": [] },
                    "context": { "studentName": "Maria Elena Torres" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let msg = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(msg.starts_with("Export failed"));
    }

    #[tokio::test]
    async fn test_export_without_backgrounds_is_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let template = serde_json::to_value(crate::template::default_template()).unwrap();
        let resp = app(dir.path())
            .oneshot(post_json(
                "/api/export",
                serde_json::json!({
                    "template": template,
                    "context": { "studentName": "Ana", "credentialCode": "CERT-7" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"certificado-CERT-7.pdf\""
        );
        assert!(body_bytes(resp).await.starts_with(b"%PDF"));
    }
}
