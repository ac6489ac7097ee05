//! # Certificate Export
//!
//! Produces the downloadable two-page PDF for one credential.
//!
//! ```text
//! Template + BindingContext
//!        │
//!        ├─ fetch front background ─┐
//!        ├─ fetch back background ──┤   any failure ─▶ DiplomaError::Export
//!        │                          ▼
//!        ├─ rasterize front ──┐   (rayon::join on a blocking thread,
//!        ├─ rasterize back ───┤    any failure ─▶ DiplomaError::Export)
//!        │                    ▼
//!        └─ assemble PDF ─▶ ExportArtifact { filename, bytes, pages }
//! ```
//!
//! Export is all-or-nothing: a document is only returned once both pages
//! rendered and the PDF was assembled. Only one export runs at a time per
//! [`Exporter`]; a second call while one is in flight is rejected.

pub mod pdf;
mod source;

pub use pdf::{Orientation, PageInfo, assemble_pdf};
pub use source::{BackgroundSource, HttpBackgroundSource};

use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::binding::{Binding, BindingContext, MetadataEntry};
use crate::config::Config;
use crate::error::DiplomaError;
use crate::render::fonts::FontBook;
use crate::render::{PageGeometry, RenderTarget, layout_page, render_layout};
use crate::template::{Page, Template};

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Front then back.
    pub pages: Vec<PageInfo>,
}

impl ExportArtifact {
    /// Write the document into `dir` under its filename. The file appears
    /// complete or not at all.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, DiplomaError> {
        std::fs::create_dir_all(dir)?;
        let target = dir.join(&self.filename);
        let partial = dir.join(format!(".{}.partial", self.filename));
        std::fs::write(&partial, &self.bytes)?;
        if let Err(e) = std::fs::rename(&partial, &target) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }
        Ok(target)
    }
}

/// `certificado-<identifier>.pdf`, unsafe characters replaced by `_`.
pub fn export_filename(identifier: Option<&str>) -> String {
    match identifier.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => {
            let safe: String = id
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect();
            format!("certificado-{}.pdf", safe)
        }
        None => "certificado.pdf".to_string(),
    }
}

/// Renders templates to PDF, one export at a time.
pub struct Exporter {
    config: Arc<Config>,
    fonts: Arc<FontBook>,
    source: Arc<dyn BackgroundSource>,
    running: Mutex<()>,
}

impl Exporter {
    pub fn new(config: Arc<Config>, fonts: Arc<FontBook>, source: Arc<dyn BackgroundSource>) -> Self {
        Self {
            config,
            fonts,
            source,
            running: Mutex::new(()),
        }
    }

    async fn background(&self, page: Page, url: &str) -> Result<Option<DynamicImage>, DiplomaError> {
        if url.trim().is_empty() {
            return Ok(None);
        }
        self.source
            .fetch(url)
            .await
            .map(Some)
            .map_err(|e| DiplomaError::Export(format!("{} background unavailable: {}", page, e)))
    }

    /// Export both pages of `template` for one credential.
    pub async fn export(
        &self,
        template: &Template,
        context: &BindingContext,
        course_metadata: &[MetadataEntry],
    ) -> Result<ExportArtifact, DiplomaError> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| DiplomaError::ExportInProgress)?;

        let template = template.clone().normalize();
        let (front_bg, back_bg) = tokio::try_join!(
            self.background(Page::Front, &template.bg_image_front),
            self.background(Page::Back, &template.bg_image_back),
        )?;

        let filename = export_filename(context.credential_identifier());
        let config = self.config.clone();
        let fonts = self.fonts.clone();
        let context = context.clone();
        let course_metadata = course_metadata.to_vec();
        let (front, back) = tokio::task::spawn_blocking(move || {
            let binding = Binding::bound(&context, &course_metadata);
            let render = |page: Page, bg: Option<&DynamicImage>| -> Result<RgbImage, DiplomaError> {
                let geometry = PageGeometry::for_background(&config, bg);
                let layout =
                    layout_page(&template, &binding, page, RenderTarget::Export, geometry, &config);
                render_layout(&layout, bg, &fonts, &config)
            };
            rayon::join(
                || render(Page::Front, front_bg.as_ref()),
                || render(Page::Back, back_bg.as_ref()),
            )
        })
        .await
        .map_err(|e| DiplomaError::Export(format!("rasterization failed: {}", e)))?;
        let front = front.map_err(|e| DiplomaError::Export(format!("front page: {}", e)))?;
        let back = back.map_err(|e| DiplomaError::Export(format!("back page: {}", e)))?;

        let (bytes, pages) =
            assemble_pdf(&[front, back]).map_err(|e| DiplomaError::Export(e.to_string()))?;
        tracing::info!(%filename, size = bytes.len(), "certificate exported");
        Ok(ExportArtifact {
            filename,
            bytes,
            pages,
        })
    }
}
