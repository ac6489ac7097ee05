//! HTTP handlers for the server.

pub mod backgrounds;
pub mod export;
pub mod preview;
pub mod templates;

use axum::http::StatusCode;

use crate::error::DiplomaError;
use crate::template::Page;

/// Map a library error to a status code and message.
pub fn error_response(e: DiplomaError) -> (StatusCode, String) {
    let status = match &e {
        DiplomaError::Template(_)
        | DiplomaError::DuplicateFieldId(_)
        | DiplomaError::DuplicateMetadataField(_)
        | DiplomaError::InvalidUpload(_)
        | DiplomaError::Json(_) => StatusCode::BAD_REQUEST,
        DiplomaError::FieldNotFound(_) => StatusCode::NOT_FOUND,
        DiplomaError::UploadInProgress(_) | DiplomaError::ExportInProgress => StatusCode::CONFLICT,
        DiplomaError::Upload(_) | DiplomaError::Export(_) | DiplomaError::Transport(_) => {
            StatusCode::BAD_GATEWAY
        }
        DiplomaError::Image(_)
        | DiplomaError::Pdf(_)
        | DiplomaError::Config(_)
        | DiplomaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    }
    (status, e.to_string())
}

/// Parse the `:page` path segment.
pub fn parse_page(segment: &str) -> Result<Page, (StatusCode, String)> {
    Page::parse(segment).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Unknown page '{}', expected front or back", segment),
        )
    })
}
