//! Server state shared across handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::editor::{BackgroundUploader, LocalObjectStore};
use crate::error::DiplomaError;
use crate::export::{BackgroundSource, Exporter, HttpBackgroundSource};
use crate::render::fonts::FontBook;

/// Application state shared across handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub fonts: Arc<FontBook>,
    /// Background loader used by previews (exports go through `exporter`).
    pub backgrounds: Arc<dyn BackgroundSource>,
    pub uploader: BackgroundUploader,
    pub exporter: Exporter,
}

impl AppState {
    /// State backed by the local uploads directory and the configured fonts.
    pub fn new(config: Config) -> Result<Self, DiplomaError> {
        let backgrounds: Arc<dyn BackgroundSource> = Arc::new(HttpBackgroundSource::new(&config)?);
        let fonts = Arc::new(FontBook::load(config.fonts_dir.as_deref()));
        Ok(Self::with_parts(config, fonts, backgrounds))
    }

    /// State with a caller-provided font book and background source.
    pub fn with_parts(
        config: Config,
        fonts: Arc<FontBook>,
        backgrounds: Arc<dyn BackgroundSource>,
    ) -> Self {
        let config = Arc::new(config);
        let store = LocalObjectStore::new(&config.uploads_dir, config.public_base_url.clone());
        let uploader = BackgroundUploader::new(Arc::new(store), config.max_upload_bytes);
        let exporter = Exporter::new(config.clone(), fonts.clone(), backgrounds.clone());
        Self {
            config,
            fonts,
            backgrounds,
            uploader,
            exporter,
        }
    }
}
