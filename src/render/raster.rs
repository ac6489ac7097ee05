//! Painting a [`PageLayout`] onto an RGB raster.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba};
use std::io::Cursor;

use super::color::color_or_black;
use super::fonts::FontBook;
use super::layout::PageLayout;
use crate::error::DiplomaError;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Rasterize a layout: white page, cover-fit background, then rules and
/// text in paint order. Text that runs past the page edge is clipped.
pub fn rasterize(layout: &PageLayout, background: Option<&DynamicImage>, fonts: &FontBook) -> RgbImage {
    let (width, height) = (layout.width, layout.height);
    let mut canvas = match background {
        Some(bg) if !layout.fallback => bg
            .resize_to_fill(width, height, FilterType::Triangle)
            .to_rgb8(),
        _ => RgbImage::from_pixel(width, height, WHITE),
    };

    for rule in &layout.rules {
        let color = color_or_black(&rule.color);
        let top = (rule.y - rule.thickness / 2.0).round() as i64;
        let rows = rule.thickness.round().max(1.0) as i64;
        for y in top..top + rows {
            for x in rule.x_start.round() as i64..rule.x_end.round() as i64 {
                blend(&mut canvas, x, y, color, 1.0);
            }
        }
    }

    for item in &layout.items {
        if item.text.is_empty() {
            continue;
        }
        let color = color_or_black(&item.color);
        let mask = fonts.render(&item.text, item.family, item.font_px);
        let left = (item.center_x - mask.width as f32 / 2.0).round() as i64;
        let top = (item.center_y - mask.height as f32 / 2.0).round() as i64;
        for my in 0..mask.height {
            for mx in 0..mask.width {
                let coverage = mask.data[my * mask.width + mx];
                if coverage > 0.0 {
                    blend(&mut canvas, left + mx as i64, top + my as i64, color, coverage);
                }
            }
        }
    }

    canvas
}

/// Alpha-blend `color` over one pixel; out-of-bounds writes are dropped.
fn blend(canvas: &mut RgbImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0) * color[3] as f32 / 255.0;
    let px = canvas.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        let under = px[c] as f32;
        px[c] = (under + (color[c] as f32 - under) * alpha).round() as u8;
    }
}

/// Encode a raster as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, DiplomaError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| DiplomaError::Image(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PlacedText, Rule};
    use crate::template::{FontFamily, Page};

    fn layout(items: Vec<PlacedText>, rules: Vec<Rule>) -> PageLayout {
        PageLayout {
            page: Page::Front,
            width: 200,
            height: 100,
            background: String::new(),
            items,
            rules,
            fallback: false,
        }
    }

    fn text(s: &str, x: f32, y: f32, color: &str) -> PlacedText {
        PlacedText {
            field_id: None,
            text: s.to_string(),
            center_x: x,
            center_y: y,
            font_px: 24.0,
            color: color.to_string(),
            family: FontFamily::Brand,
            font_fallback: false,
            bold: true,
        }
    }

    fn inked_bounds(img: &RgbImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, px) in img.enumerate_pixels() {
            if *px != WHITE {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    #[test]
    fn test_blank_page_is_white() {
        let img = rasterize(&layout(vec![], vec![]), None, &FontBook::bitmap_only());
        assert_eq!(img.dimensions(), (200, 100));
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_text_is_centered_on_anchor() {
        let img = rasterize(
            &layout(vec![text("HH", 100.0, 50.0, "#ff0000")], vec![]),
            None,
            &FontBook::bitmap_only(),
        );
        let (x0, y0, x1, y1) = inked_bounds(&img).unwrap();
        let cx = (x0 + x1) as f32 / 2.0;
        let cy = (y0 + y1) as f32 / 2.0;
        assert!((cx - 100.0).abs() <= 3.0, "center x {}", cx);
        assert!((cy - 50.0).abs() <= 4.0, "center y {}", cy);
        assert!(img.pixels().any(|p| p[0] > 200 && p[1] < 60));
    }

    #[test]
    fn test_background_is_cover_fit() {
        let bg = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([0, 0, 200])));
        let img = rasterize(&layout(vec![], vec![]), Some(&bg), &FontBook::bitmap_only());
        assert_eq!(img.dimensions(), (200, 100));
        for (x, y) in [(0, 0), (199, 99), (100, 50)] {
            let px = img.get_pixel(x, y);
            assert!(px[0] < 5 && px[2] > 195, "pixel {:?}", px);
        }
    }

    #[test]
    fn test_overflowing_text_is_clipped() {
        let long = "Una línea muy larga que no entra en la página";
        let img = rasterize(
            &layout(vec![text(long, 100.0, 50.0, "black")], vec![]),
            None,
            &FontBook::bitmap_only(),
        );
        let (x0, _, x1, _) = inked_bounds(&img).unwrap();
        assert!(x1 - x0 >= 160, "ink spans {}..{}", x0, x1);
    }

    #[test]
    fn test_rule_is_drawn() {
        let rule = Rule {
            x_start: 60.0,
            x_end: 140.0,
            y: 46.0,
            thickness: 2.0,
            color: "#000".to_string(),
        };
        let img = rasterize(&layout(vec![], vec![rule]), None, &FontBook::bitmap_only());
        assert_eq!(*img.get_pixel(100, 46), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(20, 46), WHITE);
    }

    #[test]
    fn test_encode_png_signature() {
        let png = encode_png(&RgbImage::from_pixel(2, 2, WHITE)).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
