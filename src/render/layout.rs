//! Pure page layout: which text goes where, at what size and color.

use serde::Serialize;

use super::fallback::fallback_layout;
use super::{PageGeometry, RenderTarget};
use crate::binding::Binding;
use crate::config::Config;
use crate::template::{FontFamily, Page, Template};

/// One line of text anchored at its center.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedText {
    /// Source field, `None` for fallback decoration.
    pub field_id: Option<String>,
    pub text: String,
    pub center_x: f32,
    pub center_y: f32,
    pub font_px: f32,
    pub color: String,
    #[serde(skip)]
    pub family: FontFamily,
    /// The stored family name was not recognized.
    pub font_fallback: bool,
    pub bold: bool,
}

/// Horizontal rule, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub x_start: f32,
    pub x_end: f32,
    pub y: f32,
    pub thickness: f32,
    pub color: String,
}

/// Everything needed to paint one page on one surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page: Page,
    pub width: u32,
    pub height: u32,
    /// Background URL; empty means a white page.
    pub background: String,
    /// Paint order.
    pub items: Vec<PlacedText>,
    pub rules: Vec<Rule>,
    /// The back page uses the built-in layout.
    pub fallback: bool,
}

impl PageLayout {
    /// Placed text for a field id.
    pub fn item(&self, field_id: &str) -> Option<&PlacedText> {
        self.items
            .iter()
            .find(|item| item.field_id.as_deref() == Some(field_id))
    }

    /// Ratio between surface pixels and native pixels.
    pub fn scale(&self, geometry: PageGeometry) -> f32 {
        self.width as f32 / geometry.width.max(1) as f32
    }
}

/// Lay out one page of a template for a target surface.
///
/// Visible fields of the page are placed in template order with their
/// center at `(x%, y%)` of the surface and their font size scaled by
/// `surface width / reference width`, never taller than the surface. A back page with no background and
/// no fields gets the built-in fallback layout.
pub fn layout_page(
    template: &Template,
    binding: &Binding<'_>,
    page: Page,
    target: RenderTarget,
    geometry: PageGeometry,
    config: &Config,
) -> PageLayout {
    let (width, height) = geometry.surface(target, config);
    let scale = width as f32 / config.reference_width.max(1) as f32;
    let (w, h) = (width as f32, height as f32);

    if page == Page::Back && template.needs_back_fallback() {
        let (items, rules) = fallback_layout(binding, w, h, scale, &config.institution_name);
        return PageLayout {
            page,
            width,
            height,
            background: String::new(),
            items,
            rules,
            fallback: true,
        };
    }

    let items = template
        .visible_fields_on(page)
        .map(|field| {
            let (family, font_fallback) = field.family();
            if font_fallback {
                tracing::warn!(
                    field = field.id(),
                    font = %field.font_family,
                    "unknown font family, using {}",
                    FontFamily::Brand.name()
                );
            }
            PlacedText {
                field_id: Some(field.id().to_string()),
                text: binding.text_for(field),
                center_x: field.x / 100.0 * w,
                center_y: field.y / 100.0 * h,
                font_px: (field.font_size * scale).min(h),
                color: field.color.clone(),
                family,
                font_fallback,
                bold: true,
            }
        })
        .collect();

    PageLayout {
        page,
        width,
        height,
        background: template.background(page).to_string(),
        items,
        rules: Vec::new(),
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingContext, DNI_PLACEHOLDER};
    use crate::template::{Field, default_template};
    use pretty_assertions::assert_eq;

    fn geometry() -> PageGeometry {
        PageGeometry {
            width: 1123,
            height: 794,
        }
    }

    #[test]
    fn test_bound_values_and_placeholder() {
        let ctx = BindingContext {
            student_name: Some("Maria Elena Torres".to_string()),
            ..Default::default()
        };
        let config = Config::default();
        let layout = layout_page(
            &default_template(),
            &Binding::bound(&ctx, &[]),
            Page::Front,
            RenderTarget::Export,
            geometry(),
            &config,
        );
        assert_eq!(layout.item("studentName").unwrap().text, "Maria Elena Torres");
        assert_eq!(layout.item("studentDni").unwrap().text, DNI_PLACEHOLDER);
        assert!(layout.items.iter().all(|i| i.bold));
    }

    #[test]
    fn test_hidden_fields_are_not_placed() {
        let mut t = default_template();
        t.field_mut("courseName").unwrap().visible = false;
        let layout = layout_page(
            &t,
            &Binding::Sample,
            Page::Front,
            RenderTarget::Screen { width: 800 },
            geometry(),
            &Config::default(),
        );
        assert!(layout.item("courseName").is_none());
        let order: Vec<_> = layout.items.iter().filter_map(|i| i.field_id.clone()).collect();
        assert_eq!(
            order,
            vec!["studentName", "studentDni", "issueDate", "certificateCode"]
        );
    }

    #[test]
    fn test_font_scales_with_surface() {
        let config = Config::default();
        let t = default_template();
        let half = layout_page(
            &t,
            &Binding::Sample,
            Page::Front,
            RenderTarget::Screen { width: 1123 / 2 + 1 },
            geometry(),
            &config,
        );
        let export = layout_page(&t, &Binding::Sample, Page::Front, RenderTarget::Export, geometry(), &config);
        assert_eq!(export.item("studentName").unwrap().font_px, 84.0);
        assert!((half.item("studentName").unwrap().font_px - 21.0).abs() < 0.1);
    }

    #[test]
    fn test_font_never_exceeds_surface_height() {
        let mut t = Template::default();
        t.fields
            .push(Field::new("custom-1", "Sello", Page::Front).sized(1e12).with_value("X"));
        let layout = layout_page(
            &t,
            &Binding::Sample,
            Page::Front,
            RenderTarget::Screen { width: 200 },
            geometry(),
            &Config::default(),
        );
        assert_eq!(layout.item("custom-1").unwrap().font_px, layout.height as f32);
    }

    #[test]
    fn test_unknown_font_is_flagged() {
        let mut t = default_template();
        t.fields.push(
            Field::new("custom-1", "Firma", Page::Front).with_value("Dirección Académica"),
        );
        t.fields.last_mut().unwrap().font_family = "Wingdings".to_string();
        let layout = layout_page(&t, &Binding::Sample, Page::Front, RenderTarget::Export, geometry(), &Config::default());
        let item = layout.item("custom-1").unwrap();
        assert!(item.font_fallback);
        assert_eq!(item.family, FontFamily::Brand);
        assert_eq!(item.text, "Dirección Académica");
    }

    #[test]
    fn test_back_page_uses_fields_when_present() {
        let layout = layout_page(
            &default_template(),
            &Binding::Sample,
            Page::Back,
            RenderTarget::Export,
            geometry(),
            &Config::default(),
        );
        assert!(!layout.fallback);
        assert_eq!(layout.items.len(), 2);
    }
}
