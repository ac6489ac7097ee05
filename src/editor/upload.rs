//! Background image uploads.
//!
//! Bytes are validated, handed to an [`ObjectStore`] and the returned public
//! URL is what ends up in the template. Only one upload per page may be in
//! flight: a second attempt for the same page is rejected so that two
//! uploads can never resolve out of order and leave the stale URL in place.

use async_trait::async_trait;
use image::ImageFormat;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::DiplomaError;
use crate::template::Page;

/// File storage collaborator: stores bytes and returns a public URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        extension: &str,
    ) -> Result<String, DiplomaError>;
}

/// Stores uploads as `<uuid>.<ext>` in a directory served at `public_base`.
pub struct LocalObjectStore {
    dir: PathBuf,
    public_base: String,
}

impl LocalObjectStore {
    pub fn new(dir: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        bytes: Vec<u8>,
        _content_type: &str,
        extension: &str,
    ) -> Result<String, DiplomaError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        Ok(format!("{}/{}", self.public_base.trim_end_matches('/'), name))
    }
}

/// Accepted background formats: (format, mime type, extension).
const ACCEPTED: &[(ImageFormat, &str, &str)] = &[
    (ImageFormat::Png, "image/png", "png"),
    (ImageFormat::Jpeg, "image/jpeg", "jpg"),
    (ImageFormat::WebP, "image/webp", "webp"),
];

/// Check size and sniff the format. Returns (mime type, extension).
pub fn validate_background(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(&'static str, &'static str), DiplomaError> {
    if bytes.is_empty() {
        return Err(DiplomaError::InvalidUpload("file is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(DiplomaError::InvalidUpload(format!(
            "file is {} bytes, limit is {}",
            bytes.len(),
            max_bytes
        )));
    }
    let format = image::guess_format(bytes)
        .map_err(|_| DiplomaError::InvalidUpload("unrecognized file type".to_string()))?;
    ACCEPTED
        .iter()
        .find(|(f, _, _)| *f == format)
        .map(|(_, mime, ext)| (*mime, *ext))
        .ok_or_else(|| {
            DiplomaError::InvalidUpload(format!(
                "{:?} images are not accepted; use PNG, JPEG or WebP",
                format
            ))
        })
}

/// Validates and stores backgrounds, one in-flight upload per page.
pub struct BackgroundUploader {
    store: Arc<dyn ObjectStore>,
    max_bytes: usize,
    pending: Arc<Mutex<HashSet<Page>>>,
}

/// Marks a page busy until dropped.
struct PendingUpload {
    page: Page,
    pending: Arc<Mutex<HashSet<Page>>>,
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.page);
        }
    }
}

impl BackgroundUploader {
    pub fn new(store: Arc<dyn ObjectStore>, max_bytes: usize) -> Self {
        Self {
            store,
            max_bytes,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether an upload for this page is currently running.
    pub fn is_pending(&self, page: Page) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.contains(&page))
            .unwrap_or(false)
    }

    fn begin(&self, page: Page) -> Result<PendingUpload, DiplomaError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| DiplomaError::Upload("upload state poisoned".to_string()))?;
        if !pending.insert(page) {
            return Err(DiplomaError::UploadInProgress(page.to_string()));
        }
        Ok(PendingUpload {
            page,
            pending: self.pending.clone(),
        })
    }

    /// Store a background for `page` and return its public URL.
    pub async fn upload(&self, page: Page, bytes: Vec<u8>) -> Result<String, DiplomaError> {
        let (mime, ext) = validate_background(&bytes, self.max_bytes)?;
        let _pending = self.begin(page)?;

        let size = bytes.len();
        let url = self.store.put(bytes, mime, ext).await.map_err(|e| match e {
            DiplomaError::Upload(msg) => DiplomaError::Upload(msg),
            other => DiplomaError::Upload(other.to_string()),
        })?;
        tracing::info!(%page, size, %url, "background uploaded");
        Ok(url)
    }
}
