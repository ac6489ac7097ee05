//! Lenient reading of stored template documents.
//!
//! Stored templates come in several historical shapes: a single `bgImage`
//! instead of front/back backgrounds, fields without `page`, nulls where
//! strings are expected. Everything is folded into the current shape here;
//! nothing in this module returns an error.

use serde_json::{Map, Value};

use super::Template;
use super::field::{DEFAULT_COLOR, DEFAULT_FONT_SIZE, Field, FontFamily, Page, clamp_percent};

/// Build a template from any JSON value. Non-objects yield an empty template.
pub(crate) fn template_from_value(value: &Value) -> Template {
    let Some(obj) = value.as_object() else {
        tracing::warn!("template document is not an object; using an empty template");
        return Template::default();
    };

    let legacy_bg = string_at(obj, "bgImage");
    let front = string_at(obj, "bgImageFront");
    let bg_image_front = if front.is_empty() { legacy_bg } else { front };
    let bg_image_back = string_at(obj, "bgImageBack");

    let fields = match obj.get("fields") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let field = field_from_value(item);
                if field.is_none() {
                    tracing::warn!(index = i, "dropping malformed template field");
                }
                field
            })
            .collect(),
        _ => Vec::new(),
    };

    Template {
        bg_image_front,
        bg_image_back,
        fields,
    }
}

/// Read one field. Returns `None` for non-objects and objects without an id.
pub(crate) fn field_from_value(value: &Value) -> Option<Field> {
    let obj = value.as_object()?;
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return None,
    };
    let label = string_at(obj, "label");
    let page = obj
        .get("page")
        .and_then(Value::as_str)
        .and_then(Page::parse)
        .unwrap_or_default();

    let mut field = Field::new(id, label, page);
    field.x = clamp_percent(number_at(obj, "x").unwrap_or(50.0));
    field.y = clamp_percent(number_at(obj, "y").unwrap_or(50.0));
    field.font_size = number_at(obj, "fontSize")
        .filter(|s| *s > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE);
    field.color = non_empty(string_at(obj, "color")).unwrap_or_else(|| DEFAULT_COLOR.to_string());
    field.font_family = non_empty(string_at(obj, "fontFamily"))
        .unwrap_or_else(|| FontFamily::Brand.name().to_string());
    field.visible = obj.get("visible").and_then(Value::as_bool).unwrap_or(true);
    field.value = match obj.get("value") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Some(field)
}

fn string_at(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Numbers may arrive as JSON numbers or numeric strings (old form inputs).
fn number_at(obj: &Map<String, Value>, key: &str) -> Option<f32> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
    .filter(|v| !v.is_nan())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}
