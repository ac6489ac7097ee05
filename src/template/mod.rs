//! # Certificate Template Model
//!
//! A [`Template`] is the two-page certificate design for one course: a
//! background image per page plus an ordered list of positioned text
//! [`Field`]s. It is stored by the host as an opaque JSON document.
//!
//! ```
//! use diploma::template::{Page, Template};
//!
//! // Legacy document: single background, fields without a page
//! let t = Template::from_json(r#"{
//!     "bgImage": "https://cdn.example/cert.png",
//!     "fields": [{"id": "studentName", "label": "Nombre", "x": 50, "y": 40}]
//! }"#).unwrap();
//!
//! assert_eq!(t.bg_image_front, "https://cdn.example/cert.png");
//! assert_eq!(t.fields[0].page, Page::Front);
//!
//! // Saving writes both the current keys and the legacy alias
//! let saved = t.to_value();
//! assert_eq!(saved["bgImage"], saved["bgImageFront"]);
//! ```
//!
//! ## Stored Shape
//!
//! ```text
//! {
//!   "bgImageFront": "<url>",
//!   "bgImageBack":  "<url>" | "",
//!   "bgImage":      "<url>",            // always equal to bgImageFront
//!   "fields": [ { "id", "label", "page", "x", "y", "fontSize",
//!                 "color", "fontFamily", "visible", "value"? }, ... ]
//! }
//! ```

pub mod defaults;
mod field;
mod legacy;

pub use defaults::{ACADEMIC_HOURS_KEY, LECTURE_HOURS_KEY, default_template};
pub use field::{
    CUSTOM_PREFIX, DEFAULT_COLOR, DEFAULT_FONT_SIZE, Field, FieldKind, FontFamily,
    METADATA_PREFIX, Page, SemanticField, clamp_percent,
};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::DiplomaError;

/// The full certificate design for one course.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub bg_image_front: String,
    /// Empty means a white back page.
    pub bg_image_back: String,
    /// Template order is paint order and editor list order.
    pub fields: Vec<Field>,
}

/// Write shape: current keys plus the legacy `bgImage` alias.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredTemplate<'a> {
    bg_image_front: &'a str,
    bg_image_back: &'a str,
    bg_image: &'a str,
    fields: &'a [Field],
}

impl Serialize for Template {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        StoredTemplate {
            bg_image_front: &self.bg_image_front,
            bg_image_back: &self.bg_image_back,
            bg_image: &self.bg_image_front,
            fields: &self.fields,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Template::from_value(&value))
    }
}

impl Template {
    /// Parse a stored document. Only fails when the text is not JSON;
    /// every JSON shape is normalized into a usable template.
    pub fn from_json(json: &str) -> Result<Self, DiplomaError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| DiplomaError::Template(format!("not a JSON document: {}", e)))?;
        Ok(Self::from_value(&value))
    }

    /// Normalize any JSON value (legacy or current shape) into a template.
    pub fn from_value(value: &serde_json::Value) -> Self {
        legacy::template_from_value(value)
    }

    /// Stored JSON value with the legacy alias written alongside.
    pub fn to_value(&self) -> serde_json::Value {
        // Serialization of this type cannot fail: only strings, numbers and bools.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn to_json(&self) -> Result<String, DiplomaError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Bring an in-memory template into canonical shape (coordinates in
    /// range, positive sizes). Applied on load and before every save;
    /// normalizing twice changes nothing.
    pub fn normalize(mut self) -> Self {
        for field in &mut self.fields {
            field.x = clamp_percent(field.x);
            field.y = clamp_percent(field.y);
            if !(field.font_size.is_finite() && field.font_size > 0.0) {
                field.font_size = DEFAULT_FONT_SIZE;
            }
            if field.color.trim().is_empty() {
                field.color = DEFAULT_COLOR.to_string();
            }
            if field.font_family.trim().is_empty() {
                field.font_family = FontFamily::Brand.name().to_string();
            }
        }
        self
    }

    /// Report the first id used by more than one field.
    pub fn validate(&self) -> Result<(), DiplomaError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.id()) {
                return Err(DiplomaError::DuplicateFieldId(field.id().to_string()));
            }
        }
        Ok(())
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id() == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.field(id).is_some()
    }

    /// `base` if unused, else `base-2`, `base-3`, ...
    pub fn unique_id(&self, base: &str) -> String {
        if !self.contains_id(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.contains_id(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Whether any field carries this label (the metadata join key).
    pub fn contains_label(&self, label: &str) -> bool {
        self.fields.iter().any(|f| f.label() == label)
    }

    /// All fields on a page, visible or not, in template order.
    pub fn fields_on(&self, page: Page) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.page == page)
    }

    /// Fields that paint on a page, in template order.
    pub fn visible_fields_on(&self, page: Page) -> impl Iterator<Item = &Field> {
        self.fields_on(page).filter(|f| f.visible)
    }

    pub fn background(&self, page: Page) -> &str {
        match page {
            Page::Front => &self.bg_image_front,
            Page::Back => &self.bg_image_back,
        }
    }

    pub fn set_background(&mut self, page: Page, url: impl Into<String>) {
        match page {
            Page::Front => self.bg_image_front = url.into(),
            Page::Back => self.bg_image_back = url.into(),
        }
    }

    /// True when the back page has neither a background nor any field,
    /// i.e. the template predates two-sided certificates.
    pub fn needs_back_fallback(&self) -> bool {
        self.bg_image_back.trim().is_empty() && self.fields_on(Page::Back).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_legacy_document_normalizes() {
        let t = Template::from_value(&json!({
            "bgImage": "https://cdn/cert.png",
            "fields": [
                {"id": "studentName", "label": "Nombre", "x": 50, "y": 40},
                {"id": "courseName", "label": "Curso", "x": 50, "y": 60}
            ]
        }));
        assert_eq!(t.bg_image_front, "https://cdn/cert.png");
        assert_eq!(t.bg_image_back, "");
        assert!(t.fields.iter().all(|f| f.page == Page::Front));
    }

    #[test]
    fn test_dual_write() {
        let mut t = default_template();
        t.bg_image_front = "https://cdn/front.png".to_string();
        let v = t.to_value();
        assert_eq!(v["bgImage"], json!("https://cdn/front.png"));
        assert_eq!(v["bgImageFront"], json!("https://cdn/front.png"));
        assert_eq!(v["bgImageBack"], json!(""));
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let t = default_template();
        let reloaded = Template::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, t);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut t = default_template();
        t.fields[0].x = 180.0;
        t.fields[1].font_size = 0.0;
        let once = t.normalize();
        let twice = once.clone().normalize();
        assert_eq!(once, twice);
        assert_eq!(once.fields[0].x, 100.0);
        assert_eq!(once.fields[1].font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_not_json_is_an_error() {
        assert!(matches!(
            Template::from_json("{bgImage:"),
            Err(DiplomaError::Template(_))
        ));
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let mut t = default_template();
        t.fields.push(Field::new("studentName", "Otra", Page::Back));
        assert!(matches!(
            t.validate(),
            Err(DiplomaError::DuplicateFieldId(id)) if id == "studentName"
        ));
    }

    #[test]
    fn test_unique_id() {
        let mut t = Template::default();
        assert_eq!(t.unique_id("meta-creditos"), "meta-creditos");
        t.fields.push(Field::new("meta-creditos", "Créditos", Page::Front));
        t.fields.push(Field::new("meta-creditos-2", "Créditos", Page::Front));
        assert_eq!(t.unique_id("meta-creditos"), "meta-creditos-3");
    }

    #[test]
    fn test_needs_back_fallback() {
        let mut t = Template::default();
        t.fields.push(Field::new("studentName", "Nombre", Page::Front));
        assert!(t.needs_back_fallback());

        let mut hidden_back = t.clone();
        let mut f = Field::new("studentName-back", "Nombre", Page::Back);
        f.visible = false;
        hidden_back.fields.push(f);
        assert!(!hidden_back.needs_back_fallback());

        t.bg_image_back = "https://cdn/back.png".to_string();
        assert!(!t.needs_back_fallback());
    }
}
