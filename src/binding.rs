//! # Field Value Resolution
//!
//! Turns a [`Field`] into the text it displays. Rendering bound data (export,
//! verification) goes through [`resolve_field_value`]; the editor's sample
//! preview goes through [`Binding::Sample`].
//!
//! | Field kind | Displayed text |
//! |------------|----------------|
//! | Name | student name |
//! | Dni | `"DNI: <dni>"` or `"DNI: --------"` |
//! | CourseName | course title |
//! | Date | `"15 de Enero, 2026"` or `"Fecha no disponible"` |
//! | Code | display code, else raw credential id |
//! | Metadata | context metadata by label, then course metadata list |
//! | Custom | the field's own `value` |
//! | Unknown | empty |
//!
//! Resolution never fails: a missing value becomes an empty string or one
//! of the placeholders above.

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::template::{Field, FieldKind, SemanticField};

pub const DNI_PLACEHOLDER: &str = "DNI: --------";
pub const DATE_PLACEHOLDER: &str = "Fecha no disponible";

const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// One `{key, value}` pair of a course's metadata list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Runtime data a certificate is rendered with. Built per render call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BindingContext {
    pub student_name: Option<String>,
    pub student_dni: Option<String>,
    pub course_title: Option<String>,
    /// Issuance timestamp; the date is taken in this timestamp's own offset.
    pub issued_at: Option<DateTime<FixedOffset>>,
    /// Human-facing code (e.g. `CERT-2026-0042`).
    pub credential_code: Option<String>,
    /// Raw credential identifier, shown when there is no display code.
    pub credential_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl BindingContext {
    /// Identifier used in export file names.
    pub fn credential_identifier(&self) -> Option<&str> {
        present(&self.credential_code).or_else(|| present(&self.credential_id))
    }
}

/// Where field text comes from for one render.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    /// Editor preview: each field shows its sample `value`, else its label.
    Sample,
    /// Real data: binding context first, course metadata list as fallback.
    Bound {
        context: &'a BindingContext,
        course_metadata: &'a [MetadataEntry],
    },
}

impl<'a> Binding<'a> {
    pub fn bound(context: &'a BindingContext, course_metadata: &'a [MetadataEntry]) -> Self {
        Binding::Bound {
            context,
            course_metadata,
        }
    }

    /// Text a field displays under this binding.
    pub fn text_for(&self, field: &Field) -> String {
        match self {
            Binding::Sample => field
                .value
                .clone()
                .unwrap_or_else(|| field.label().to_string()),
            Binding::Bound {
                context,
                course_metadata,
            } => resolve_field_value(field, context, course_metadata),
        }
    }
}

/// Resolve the text a field displays for real data.
pub fn resolve_field_value(
    field: &Field,
    context: &BindingContext,
    course_metadata: &[MetadataEntry],
) -> String {
    match field.kind() {
        FieldKind::Semantic { which, .. } => resolve_semantic(*which, context),
        FieldKind::MetadataBound { key } => lookup_metadata(key, context, course_metadata)
            .unwrap_or_default()
            .to_string(),
        FieldKind::Custom => field.value.clone().unwrap_or_default(),
        FieldKind::Unknown => String::new(),
    }
}

fn resolve_semantic(which: SemanticField, ctx: &BindingContext) -> String {
    match which {
        SemanticField::Name => present(&ctx.student_name).unwrap_or_default().to_string(),
        SemanticField::Dni => match present(&ctx.student_dni) {
            Some(dni) => format!("DNI: {}", dni),
            None => DNI_PLACEHOLDER.to_string(),
        },
        SemanticField::CourseName => present(&ctx.course_title).unwrap_or_default().to_string(),
        SemanticField::Date => ctx
            .issued_at
            .as_ref()
            .map(format_long_date)
            .unwrap_or_else(|| DATE_PLACEHOLDER.to_string()),
        SemanticField::Code => ctx.credential_identifier().unwrap_or_default().to_string(),
    }
}

/// Context map first, then the first matching entry of the course list.
pub fn lookup_metadata<'a>(
    key: &str,
    context: &'a BindingContext,
    course_metadata: &'a [MetadataEntry],
) -> Option<&'a str> {
    context
        .metadata
        .get(key)
        .map(String::as_str)
        .or_else(|| {
            course_metadata
                .iter()
                .find(|entry| entry.key == key)
                .map(|entry| entry.value.as_str())
        })
}

/// `"15 de Enero, 2026"`.
pub fn format_long_date(ts: &DateTime<FixedOffset>) -> String {
    let month = MONTHS[ts.month0() as usize];
    format!("{} de {}, {}", ts.day(), month, ts.year())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
