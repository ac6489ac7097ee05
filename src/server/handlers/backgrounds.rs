//! Background upload handler.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

use crate::template::Page;

use super::super::state::AppState;
use super::{error_response, parse_page};

/// Response from the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub page: Page,
    pub url: String,
}

/// Reject uploads whose file name announces a non-image type. Names with
/// no known extension pass; the content is sniffed later either way.
fn check_file_name(name: &str) -> Result<(), (StatusCode, String)> {
    match mime_guess::from_path(name).first() {
        Some(mime) if mime.type_() != mime_guess::mime::IMAGE => Err((
            StatusCode::BAD_REQUEST,
            format!("'{}' is {}, expected an image", name, mime.essence_str()),
        )),
        _ => Ok(()),
    }
}

/// POST /api/backgrounds/:page - Store a background image (multipart field
/// `file`) and return its public URL.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let page = parse_page(&page)?;

    let mut data: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            if let Some(name) = field.file_name() {
                check_file_name(name)?;
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e)))?;
            data = Some(bytes.to_vec());
            break;
        }
    }
    let bytes = data.ok_or((StatusCode::BAD_REQUEST, "No file field found".to_string()))?;

    let url = state
        .uploader
        .upload(page, bytes)
        .await
        .map_err(error_response)?;
    Ok(Json(UploadResponse { page, url }))
}
