//! Seed layouts for templates created on first use.

use super::Template;
use super::field::{Field, METADATA_PREFIX, Page, SemanticField};

/// Metadata key for academic hours.
pub const ACADEMIC_HOURS_KEY: &str = "Horas Académicas";

/// Metadata key for lecture hours.
pub const LECTURE_HOURS_KEY: &str = "Horas Lectivas";

/// Template seeded with the default front and back layouts and no backgrounds.
pub fn default_template() -> Template {
    let mut fields = default_front_fields();
    fields.extend(default_back_fields());
    Template {
        bg_image_front: String::new(),
        bg_image_back: String::new(),
        fields,
    }
}

/// Name, DNI, course title, date and registration code.
pub fn default_front_fields() -> Vec<Field> {
    vec![
        Field::new(SemanticField::Name.id(Page::Front), "Nombre del Estudiante", Page::Front)
            .at(50.0, 42.0)
            .sized(42.0)
            .with_value("Nombre Apellido"),
        Field::new(SemanticField::Dni.id(Page::Front), "DNI", Page::Front)
            .at(50.0, 50.0)
            .sized(20.0)
            .with_value("DNI: 12345678"),
        Field::new(SemanticField::CourseName.id(Page::Front), "Nombre del Curso", Page::Front)
            .at(50.0, 60.0)
            .sized(28.0)
            .with_value("Nombre del Curso"),
        Field::new(SemanticField::Date.id(Page::Front), "Fecha de Emisión", Page::Front)
            .at(30.0, 85.0)
            .sized(18.0)
            .with_value("15 de Enero, 2026"),
        Field::new(SemanticField::Code.id(Page::Front), "Código de Registro", Page::Front)
            .at(70.0, 85.0)
            .sized(18.0)
            .with_value("CERT-0001"),
    ]
}

/// Registration code and name.
pub fn default_back_fields() -> Vec<Field> {
    vec![
        Field::new(SemanticField::Code.id(Page::Back), "Código de Registro", Page::Back)
            .at(50.0, 30.0)
            .sized(22.0)
            .with_value("CERT-0001"),
        Field::new(SemanticField::Name.id(Page::Back), "Nombre del Estudiante", Page::Back)
            .at(50.0, 50.0)
            .sized(28.0)
            .with_value("Nombre Apellido"),
    ]
}

/// Field id derived from a metadata key: `meta-` + lowercase, dash-separated.
pub fn metadata_field_id(key: &str) -> String {
    let slug = key
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("{}{}", METADATA_PREFIX, slug)
}

/// Default field bound to a metadata key, placed on the front page.
pub fn metadata_field(key: &str) -> Field {
    let y = match key {
        ACADEMIC_HOURS_KEY => 70.0,
        LECTURE_HOURS_KEY => 74.0,
        _ => 78.0,
    };
    Field::new(metadata_field_id(key), key, Page::Front)
        .at(50.0, y)
        .sized(18.0)
        .with_value(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FieldKind;

    #[test]
    fn test_default_template_shape() {
        let t = default_template();
        assert_eq!(t.fields_on(Page::Front).count(), 5);
        assert_eq!(t.fields_on(Page::Back).count(), 2);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_metadata_field_id() {
        assert_eq!(metadata_field_id("Horas Académicas"), "meta-horas-académicas");
        assert_eq!(metadata_field_id("  Créditos "), "meta-créditos");
    }

    #[test]
    fn test_metadata_field_is_bound_by_label() {
        let field = metadata_field(LECTURE_HOURS_KEY);
        assert_eq!(
            field.kind(),
            &FieldKind::MetadataBound {
                key: LECTURE_HOURS_KEY.to_string()
            }
        );
    }
}
