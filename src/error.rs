//! # Error Types
//!
//! This module defines error types used throughout the diploma library.
//!
//! Resolution problems (unknown field ids, missing binding values) are not
//! errors: they resolve to an empty string or a placeholder. Everything here
//! is something an operator or a host application has to be told about.

use thiserror::Error;

/// Main error type for diploma operations
#[derive(Debug, Error)]
pub enum DiplomaError {
    /// Template document could not be read at all (not JSON)
    #[error("Template error: {0}")]
    Template(String),

    /// No field with this id exists in the template
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// A field with this id already exists in the template
    #[error("Duplicate field id: {0}")]
    DuplicateFieldId(String),

    /// A metadata field with this label is already placed
    #[error("A field for metadata key '{0}' already exists")]
    DuplicateMetadataField(String),

    /// Background upload rejected before reaching storage (type, size)
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Another background upload for the same page has not finished yet
    #[error("An upload for the {0} page is already in progress")]
    UploadInProgress(String),

    /// Storage collaborator failed to store the background
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Export aborted; no document was produced
    #[error("Export failed: {0}")]
    Export(String),

    /// A previous export is still running
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// PDF assembly error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Background download or read failed, or the HTTP listener could not bind
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
