//! # Page Rendering
//!
//! Rendering is split in two steps:
//!
//! ```text
//! Template + Binding ──layout_page──▶ PageLayout ──rasterize──▶ RgbImage
//!                       (pure)          (positions, text,        (pixels)
//!                                        sizes, colors)
//! ```
//!
//! A layout is a pure function of the template, the binding, the page and
//! the target. Screen and export targets differ only in the surface width,
//! and every position and size is proportional to it, so a preview at any
//! zoom and the high-resolution export place every field at the same
//! relative spot.
//!
//! ## Modules
//!
//! - [`color`]: field color strings
//! - [`fonts`]: TTF faces with a bitmap fallback
//! - [`raster`]: drawing a layout onto pixels

pub mod color;
mod fallback;
pub mod fonts;
mod layout;
pub mod raster;

pub use fallback::FALLBACK_CODE_LABEL;
pub use layout::{PageLayout, PlacedText, Rule, layout_page};

use image::{DynamicImage, RgbImage};

use crate::binding::Binding;
use crate::config::Config;
use crate::error::DiplomaError;
use crate::template::{Page, Template};
use fonts::FontBook;

/// Tallest page relative to its width. Backgrounds with a more extreme
/// aspect are cover-fit onto this shape.
pub const MAX_ASPECT: f64 = 4.0;

/// What a layout is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Interactive preview on a surface of this width in pixels.
    Screen { width: u32 },
    /// Print raster at the configured export scale.
    Export,
}

impl RenderTarget {
    /// Surface width in pixels for this target. Screens are never wider
    /// than the export raster.
    pub fn width(self, config: &Config) -> u32 {
        match self {
            RenderTarget::Screen { width } => width.clamp(1, config.export_width().max(1)),
            RenderTarget::Export => config.export_width(),
        }
    }
}

/// Native (1:1 editor) size of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
}

impl PageGeometry {
    /// Page at the reference width, with the background's aspect ratio or the
    /// default height when there is no background.
    pub fn for_background(config: &Config, background: Option<&DynamicImage>) -> Self {
        let width = config.reference_width;
        let height = match background {
            Some(bg) if bg.width() > 0 && bg.height() > 0 => {
                ((width as f64 * bg.height() as f64 / bg.width() as f64).round() as u32).max(1)
            }
            _ => config.default_height,
        };
        Self { width, height }
    }

    /// Surface size for a target, keeping this page's aspect ratio up to
    /// [`MAX_ASPECT`].
    pub fn surface(&self, target: RenderTarget, config: &Config) -> (u32, u32) {
        let width = target.width(config);
        let aspect = (self.height as f64 / self.width.max(1) as f64).min(MAX_ASPECT);
        let height = (width as f64 * aspect).round() as u32;
        (width, height.max(1))
    }
}

/// Rasterize a layout, refusing surfaces over the configured pixel budget.
pub fn render_layout(
    layout: &PageLayout,
    background: Option<&DynamicImage>,
    fonts: &FontBook,
    config: &Config,
) -> Result<RgbImage, DiplomaError> {
    let pixels = layout.width as u64 * layout.height as u64;
    if pixels > config.max_raster_pixels {
        return Err(DiplomaError::Image(format!(
            "{} page raster {}x{} exceeds the {} pixel limit",
            layout.page, layout.width, layout.height, config.max_raster_pixels
        )));
    }
    Ok(raster::rasterize(layout, background, fonts))
}

/// Lay out and rasterize one page as PNG.
pub fn render_page_png(
    template: &Template,
    binding: &Binding<'_>,
    page: Page,
    target: RenderTarget,
    background: Option<&DynamicImage>,
    fonts: &FontBook,
    config: &Config,
) -> Result<Vec<u8>, DiplomaError> {
    let geometry = PageGeometry::for_background(config, background);
    let layout = layout_page(template, binding, page, target, geometry, config);
    let image = render_layout(&layout, background, fonts, config)?;
    raster::encode_png(&image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_follows_background_aspect() {
        let config = Config::default();
        let portrait = DynamicImage::new_rgb8(600, 800);
        let g = PageGeometry::for_background(&config, Some(&portrait));
        assert_eq!(g, PageGeometry { width: 1123, height: 1497 });

        let none = PageGeometry::for_background(&config, None);
        assert_eq!(none.height, 794);
    }

    #[test]
    fn test_export_surface_is_scaled() {
        let config = Config::default();
        let g = PageGeometry { width: 1123, height: 794 };
        assert_eq!(g.surface(RenderTarget::Export, &config), (2246, 1588));
        assert_eq!(
            g.surface(RenderTarget::Screen { width: 1123 }, &config),
            (1123, 794)
        );
    }

    #[test]
    fn test_huge_screen_width_is_capped() {
        let config = Config::default();
        let png = render_page_png(
            &crate::template::default_template(),
            &Binding::Sample,
            Page::Front,
            RenderTarget::Screen { width: u32::MAX },
            None,
            &FontBook::bitmap_only(),
            &config,
        )
        .unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (2246, 1588));
    }

    #[test]
    fn test_extreme_aspect_is_capped() {
        let config = Config::default();
        let sliver = DynamicImage::new_rgb8(1, 100_000);
        let g = PageGeometry::for_background(&config, Some(&sliver));
        assert_eq!(g.surface(RenderTarget::Export, &config), (2246, 8984));
    }

    #[test]
    fn test_huge_font_size_renders() {
        let template = Template::from_json(
            r#"{"fields": [{"id": "custom-1", "value": "Firma", "x": 50, "y": 50, "fontSize": 1e12}]}"#,
        )
        .unwrap();
        let config = Config::default();
        let png = render_page_png(
            &template,
            &Binding::Sample,
            Page::Front,
            RenderTarget::Screen { width: 200 },
            None,
            &FontBook::bitmap_only(),
            &config,
        )
        .unwrap();
        assert_eq!(image::load_from_memory(&png).unwrap().width(), 200);
    }

    #[test]
    fn test_raster_budget_is_enforced() {
        let config = Config {
            max_raster_pixels: 1_000_000,
            ..Config::default()
        };
        let layout = layout_page(
            &Template::default(),
            &Binding::Sample,
            Page::Front,
            RenderTarget::Export,
            PageGeometry::for_background(&config, None),
            &config,
        );
        let err = render_layout(&layout, None, &FontBook::bitmap_only(), &config).unwrap_err();
        assert!(matches!(err, DiplomaError::Image(_)));
    }
}
