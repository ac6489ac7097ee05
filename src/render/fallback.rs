//! Built-in back page for templates that predate two-sided certificates.
//!
//! ```text
//!            CÓDIGO DE REGISTRO        y 28%
//!               CERT-2026-0042         y 36%
//!         ──────────────────────────   y 46%, x 30%..70%
//!                 Otorgado a           y 56%
//!             Maria Elena Torres       y 64%
//!
//!           Centro de Capacitación     y 88%
//! ```

use super::layout::{PlacedText, Rule};
use crate::binding::Binding;
use crate::template::{Field, FontFamily, Page, SemanticField};

pub const FALLBACK_CODE_LABEL: &str = "CÓDIGO DE REGISTRO";
const AWARDED_TO: &str = "Otorgado a";

const INK: &str = "#1a1a1a";
const MUTED: &str = "#6b6b6b";

enum Row {
    Static(&'static str),
    Code,
    Name,
    Institution,
}

/// Text rows: (text source, y %, native font px, color).
const ROWS: &[(Row, f32, f32, &str)] = &[
    (Row::Static(FALLBACK_CODE_LABEL), 28.0, 16.0, MUTED),
    (Row::Code, 36.0, 28.0, INK),
    (Row::Static(AWARDED_TO), 56.0, 16.0, MUTED),
    (Row::Name, 64.0, 34.0, INK),
    (Row::Institution, 88.0, 14.0, MUTED),
];

/// Fallback items and divider on a `width` × `height` surface.
pub(crate) fn fallback_layout(
    binding: &Binding<'_>,
    width: f32,
    height: f32,
    scale: f32,
    institution: &str,
) -> (Vec<PlacedText>, Vec<Rule>) {
    let code_field = Field::new(SemanticField::Code.id(Page::Back), "Código de Registro", Page::Back)
        .with_value("CERT-0001");
    let name_field = Field::new(SemanticField::Name.id(Page::Back), "Nombre del Estudiante", Page::Back)
        .with_value("Nombre Apellido");

    let items = ROWS
        .iter()
        .map(|(row, y, size, color)| {
            let text = match row {
                Row::Static(s) => s.to_string(),
                Row::Code => binding.text_for(&code_field),
                Row::Name => binding.text_for(&name_field),
                Row::Institution => institution.to_string(),
            };
            PlacedText {
                field_id: None,
                text,
                center_x: 0.5 * width,
                center_y: y / 100.0 * height,
                font_px: size * scale,
                color: color.to_string(),
                family: FontFamily::Brand,
                font_fallback: false,
                bold: true,
            }
        })
        .collect();

    let divider = Rule {
        x_start: 0.30 * width,
        x_end: 0.70 * width,
        y: 0.46 * height,
        thickness: (2.0 * scale).max(1.0),
        color: MUTED.to_string(),
    };

    (items, vec![divider])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingContext;
    use crate::config::Config;
    use crate::render::{PageGeometry, RenderTarget, layout_page};
    use crate::template::Template;
    use crate::template::defaults::default_front_fields;

    #[test]
    fn test_legacy_template_gets_fallback_back() {
        let template = Template {
            bg_image_front: "https://cdn/front.png".to_string(),
            bg_image_back: String::new(),
            fields: default_front_fields(),
        };
        let ctx = BindingContext {
            student_name: Some("Maria Elena Torres".to_string()),
            credential_code: Some("CERT-2026-0042".to_string()),
            ..Default::default()
        };
        let config = Config::default();
        let layout = layout_page(
            &template,
            &Binding::bound(&ctx, &[]),
            Page::Back,
            RenderTarget::Export,
            PageGeometry::for_background(&config, None),
            &config,
        );
        assert!(layout.fallback);
        let texts: Vec<&str> = layout.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                FALLBACK_CODE_LABEL,
                "CERT-2026-0042",
                "Otorgado a",
                "Maria Elena Torres",
                "Centro de Capacitación"
            ]
        );
        assert_eq!(layout.rules.len(), 1);
        assert_eq!(layout.rules[0].x_start, 0.30 * 2246.0);
    }

    #[test]
    fn test_fallback_code_uses_raw_id() {
        let ctx = BindingContext {
            credential_id: Some("8f14e45f".to_string()),
            ..Default::default()
        };
        let (items, _) = fallback_layout(&Binding::bound(&ctx, &[]), 1000.0, 700.0, 1.0, "X");
        assert_eq!(items[1].text, "8f14e45f");
        assert_eq!(items[3].text, "");
    }
}
