//! Font loading and text rasterization.
//!
//! Each [`FontFamily`] maps to one bold TTF face loaded from the configured
//! fonts directory. Families without a face are drawn with the built-in
//! Spleen 12×24 bitmap font scaled to the requested pixel size, so a page
//! always renders even on a machine with no fonts installed.

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{FONT_12X24, PSF2Font};
use std::collections::HashMap;
use std::path::Path;

use crate::template::FontFamily;

const BITMAP_WIDTH: usize = 12;
const BITMAP_HEIGHT: usize = 24;

/// Largest pixel size text is rasterized at.
pub const MAX_TEXT_PX: f32 = 2048.0;

/// Widest text mask. Ink past this edge is dropped.
const MAX_MASK_WIDTH: usize = 16_384;

/// Rendered text as a coverage mask.
pub struct TextMask {
    pub width: usize,
    pub height: usize,
    /// Coverage per pixel: 0.0 = transparent, 1.0 = full ink.
    pub data: Vec<f32>,
}

impl TextMask {
    fn empty(width: usize, height: usize) -> Self {
        let width = width.clamp(1, MAX_MASK_WIDTH);
        let height = height.clamp(1, MAX_TEXT_PX as usize);
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let idx = y as usize * self.width + x as usize;
            self.data[idx] = (self.data[idx] + coverage).min(1.0);
        }
    }
}

/// Bold faces for the certificate font families.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: HashMap<FontFamily, FontArc>,
}

impl FontBook {
    /// No TTF faces: everything renders with the bitmap font.
    pub fn bitmap_only() -> Self {
        Self::default()
    }

    /// Load `<Family>-Bold.ttf` for every family found in `dir`.
    pub fn load(dir: Option<&Path>) -> Self {
        let mut book = Self::default();
        let Some(dir) = dir else {
            return book;
        };
        for family in FontFamily::ALL {
            let path = dir.join(family.bold_file());
            match std::fs::read(&path) {
                Ok(bytes) => match FontArc::try_from_vec(bytes) {
                    Ok(font) => {
                        book.faces.insert(family, font);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "invalid font file")
                    }
                },
                Err(_) => {
                    tracing::warn!(
                        family = family.name(),
                        path = %path.display(),
                        "font not found, using bitmap font"
                    )
                }
            }
        }
        book
    }

    pub fn has_face(&self, family: FontFamily) -> bool {
        self.faces.contains_key(&family)
    }

    /// Face for a family, falling back to the brand face.
    fn face(&self, family: FontFamily) -> Option<&FontArc> {
        self.faces
            .get(&family)
            .or_else(|| self.faces.get(&FontFamily::Brand))
    }

    /// Rasterize one line of text at `pixel_height`, capped at
    /// [`MAX_TEXT_PX`]. Never wraps.
    pub fn render(&self, text: &str, family: FontFamily, pixel_height: f32) -> TextMask {
        let pixel_height = if pixel_height.is_finite() {
            pixel_height.clamp(1.0, MAX_TEXT_PX)
        } else {
            1.0
        };
        match self.face(family) {
            Some(font) => render_outline(font, text, pixel_height),
            None => render_bitmap(text, pixel_height),
        }
    }
}

fn render_outline(font: &FontArc, text: &str, pixel_height: f32) -> TextMask {
    let scaled = font.as_scaled(pixel_height);

    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }

    let ascent = scaled.ascent();
    let line_height = (ascent - scaled.descent()).ceil() as usize;
    let mut mask = TextMask::empty(caret_x.ceil() as usize, line_height);

    for (glyph_id, glyph_x) in glyphs {
        let glyph =
            glyph_id.with_scale_and_position(pixel_height, ab_glyph::point(glyph_x, ascent));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                mask.add(
                    px as i32 + bounds.min.x as i32,
                    py as i32 + bounds.min.y as i32,
                    coverage,
                );
            });
        }
    }
    mask
}

/// Hollow box for characters the bitmap font lacks.
fn missing_glyph(ch: char) -> Vec<bool> {
    let mut bits = vec![false; BITMAP_WIDTH * BITMAP_HEIGHT];
    if ch.is_whitespace() {
        return bits;
    }
    for x in 2..BITMAP_WIDTH - 2 {
        bits[4 * BITMAP_WIDTH + x] = true;
        bits[(BITMAP_HEIGHT - 5) * BITMAP_WIDTH + x] = true;
    }
    for y in 4..BITMAP_HEIGHT - 4 {
        bits[y * BITMAP_WIDTH + 2] = true;
        bits[y * BITMAP_WIDTH + BITMAP_WIDTH - 3] = true;
    }
    bits
}

/// Nearest-neighbour scaled Spleen glyphs, emboldened by one extra column.
fn render_bitmap(text: &str, pixel_height: f32) -> TextMask {
    let scale = pixel_height / BITMAP_HEIGHT as f32;
    let advance = BITMAP_WIDTH as f32 * scale;
    let chars: Vec<char> = text.chars().collect();
    let width = (advance * chars.len() as f32).ceil() as usize;
    let height = pixel_height.ceil() as usize;
    let mut mask = TextMask::empty(width, height);

    let mut spleen = PSF2Font::new(FONT_12X24).ok();
    let bold = scale.max(1.0).round() as i32;

    for (i, ch) in chars.into_iter().enumerate() {
        let utf8 = ch.to_string();
        let bits = match spleen
            .as_mut()
            .and_then(|font| font.glyph_for_utf8(utf8.as_bytes()))
        {
            Some(glyph) => {
                let mut bits = vec![false; BITMAP_WIDTH * BITMAP_HEIGHT];
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < BITMAP_HEIGHT && col_x < BITMAP_WIDTH {
                            bits[row_y * BITMAP_WIDTH + col_x] = on;
                        }
                    }
                }
                bits
            }
            None => missing_glyph(ch),
        };
        let origin_x = i as f32 * advance;
        if origin_x >= mask.width as f32 {
            break;
        }
        for y in 0..mask.height {
            let src_y = ((y as f32 / scale) as usize).min(BITMAP_HEIGHT - 1);
            let cell_w = advance.ceil() as usize;
            for x in 0..cell_w {
                let src_x = ((x as f32 / scale) as usize).min(BITMAP_WIDTH - 1);
                if bits[src_y * BITMAP_WIDTH + src_x] {
                    let dx = origin_x as i32 + x as i32;
                    for b in 0..bold {
                        mask.add(dx + b, y as i32, 1.0);
                    }
                }
            }
        }
    }
    mask
}
