//! # Engine Configuration
//!
//! Page geometry, export resolution and the on-disk locations the engine
//! reads from (fonts) and writes to (uploaded backgrounds).
//!
//! ## Page Geometry
//!
//! | Property | Default | Notes |
//! |----------|---------|-------|
//! | Reference width | 1123 px | A4 landscape at 96 dpi |
//! | Default height | 794 px | Used when a page has no background |
//! | Export scale | 2.0 | Export raster = reference × scale, at most 8.0 |
//! | Raster budget | 40 Mpx | Largest page raster ever allocated |
//!
//! ## Usage
//!
//! ```
//! use diploma::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.export_width(), 2246);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DiplomaError;

/// Lowest accepted export scale (print quality).
pub const MIN_EXPORT_SCALE: f32 = 2.0;

/// Highest accepted export scale.
pub const MAX_EXPORT_SCALE: f32 = 8.0;

/// # Engine Configuration
///
/// Every field has a default, so a config file only needs the keys it
/// overrides:
///
/// ```json
/// { "fonts_dir": "./fonts", "institution_name": "Instituto Andino" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Width in pixels of a page at its native (editor, 1:1) resolution.
    /// Field font sizes are expressed at this width.
    pub reference_width: u32,

    /// Native page height when a page has no background to take an aspect from.
    pub default_height: u32,

    /// Export raster scale relative to the native page.
    pub export_scale: f32,

    /// Directory holding `<Family>-Bold.ttf` files. `None` uses the built-in bitmap font.
    pub fonts_dir: Option<PathBuf>,

    /// Directory uploaded backgrounds are stored in.
    pub uploads_dir: PathBuf,

    /// URL prefix under which `uploads_dir` is served.
    pub public_base_url: String,

    /// Largest page raster, in pixels, a preview or export may allocate.
    pub max_raster_pixels: u64,

    /// Largest accepted background upload in bytes.
    pub max_upload_bytes: usize,

    /// Institution printed in the back-page fallback footer.
    pub institution_name: String,

    /// Address the HTTP service listens on.
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_width: 1123,
            default_height: 794,
            export_scale: MIN_EXPORT_SCALE,
            fonts_dir: None,
            uploads_dir: PathBuf::from("uploads"),
            public_base_url: "/uploads".to_string(),
            max_raster_pixels: 40_000_000,
            max_upload_bytes: 10 * 1024 * 1024,
            institution_name: "Centro de Capacitación".to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, DiplomaError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DiplomaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| DiplomaError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the renderer relies on.
    pub fn validate(&self) -> Result<(), DiplomaError> {
        if self.reference_width == 0 || self.default_height == 0 {
            return Err(DiplomaError::Config(
                "page geometry must be positive".to_string(),
            ));
        }
        if !(MIN_EXPORT_SCALE..=MAX_EXPORT_SCALE).contains(&self.export_scale) {
            return Err(DiplomaError::Config(format!(
                "export_scale must be between {} and {}, got {}",
                MIN_EXPORT_SCALE, MAX_EXPORT_SCALE, self.export_scale
            )));
        }
        if self.max_raster_pixels == 0 {
            return Err(DiplomaError::Config(
                "max_raster_pixels must be positive".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(DiplomaError::Config(
                "max_upload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Export raster width for a page.
    ///
    /// ## Example
    ///
    /// ```
    /// use diploma::config::Config;
    ///
    /// let config = Config { export_scale: 3.0, ..Config::default() };
    /// assert_eq!(config.export_width(), 3369);
    /// ```
    #[inline]
    pub fn export_width(&self) -> u32 {
        (self.reference_width as f32 * self.export_scale).round() as u32
    }
}
