//! Reconciliation of the two auto-managed "hours" metadata fields.
//!
//! Only `Horas Académicas` and `Horas Lectivas` are managed here. Fields
//! for any other metadata key are never added or removed automatically.

use serde::{Deserialize, Serialize};

use crate::template::defaults::metadata_field;
use crate::template::{ACADEMIC_HOURS_KEY, FieldKind, LECTURE_HOURS_KEY, Template};

/// Which hour counts a course certifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoursMode {
    Academic,
    Lecture,
    Both,
}

impl HoursMode {
    /// Keys that must have a field in this mode.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            HoursMode::Academic => &[ACADEMIC_HOURS_KEY],
            HoursMode::Lecture => &[LECTURE_HOURS_KEY],
            HoursMode::Both => &[ACADEMIC_HOURS_KEY, LECTURE_HOURS_KEY],
        }
    }

    /// Key whose field is removed in this mode.
    pub fn excluded_key(self) -> Option<&'static str> {
        match self {
            HoursMode::Academic => Some(LECTURE_HOURS_KEY),
            HoursMode::Lecture => Some(ACADEMIC_HOURS_KEY),
            HoursMode::Both => None,
        }
    }
}

/// Apply a mode to a template. Returns `true` when the template changed.
///
/// Removes the field bound to the excluded key, then adds a default field
/// for each required key that has no field with that label yet.
pub fn reconcile_hours(template: &mut Template, mode: HoursMode) -> bool {
    let before = template.fields.len();

    if let Some(excluded) = mode.excluded_key() {
        template.fields.retain(|f| {
            !matches!(f.kind(), FieldKind::MetadataBound { key } if key == excluded)
        });
    }
    let mut changed = template.fields.len() != before;

    for key in mode.required_keys() {
        if template.contains_label(key) {
            continue;
        }
        let field = metadata_field(key);
        let id = template.unique_id(field.id());
        let field = field.with_id(id);
        template.fields.push(field);
        changed = true;
    }

    changed
}
