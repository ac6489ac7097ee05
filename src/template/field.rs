//! Field records and the closed set of field kinds and font families.

use serde::{Deserialize, Serialize};

/// Prefix of fields bound to a course metadata key (looked up by label).
pub const METADATA_PREFIX: &str = "meta-";

/// Prefix of free-text decoration fields.
pub const CUSTOM_PREFIX: &str = "custom-";

/// Suffix marking the back-page twin of a semantic field.
const BACK_SUFFIX: &str = "-back";

pub const DEFAULT_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_COLOR: &str = "#1a1a1a";

/// Which side of the certificate a field lives on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Front,
    Back,
}

impl Page {
    pub fn as_str(self) -> &'static str {
        match self {
            Page::Front => "front",
            Page::Back => "back",
        }
    }

    /// Lenient parse used for legacy documents and URL path segments.
    pub fn parse(s: &str) -> Option<Page> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Some(Page::Front),
            "back" => Some(Page::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic fields with built-in resolution rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticField {
    Name,
    Dni,
    CourseName,
    Date,
    Code,
}

/// Semantic ids: (canonical, alias, kind). The back twin appends `-back`.
const SEMANTIC_IDS: &[(&str, &str, SemanticField)] = &[
    ("studentName", "name", SemanticField::Name),
    ("studentDni", "dni", SemanticField::Dni),
    ("courseName", "course-name", SemanticField::CourseName),
    ("issueDate", "date", SemanticField::Date),
    ("certificateCode", "code", SemanticField::Code),
];

impl SemanticField {
    /// Canonical field id for this semantic field on a page.
    pub fn id(self, page: Page) -> String {
        let base = SEMANTIC_IDS
            .iter()
            .find(|(_, _, which)| *which == self)
            .map(|(id, _, _)| *id)
            .unwrap_or_default();
        match page {
            Page::Front => base.to_string(),
            Page::Back => format!("{}{}", base, BACK_SUFFIX),
        }
    }
}

/// How a field's displayed text is obtained.
///
/// Classified once from the id (and label, for metadata fields) when the
/// field is built, so rendering never re-parses id strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldKind {
    Semantic { which: SemanticField, side: Page },
    /// Joined to metadata by the field label.
    MetadataBound { key: String },
    Custom,
    #[default]
    Unknown,
}

impl FieldKind {
    pub fn classify(id: &str, label: &str) -> FieldKind {
        let (base, side) = match id.strip_suffix(BACK_SUFFIX) {
            Some(base) => (base, Page::Back),
            None => (id, Page::Front),
        };
        if let Some((_, _, which)) = SEMANTIC_IDS
            .iter()
            .find(|(canonical, alias, _)| *canonical == base || *alias == base)
        {
            return FieldKind::Semantic {
                which: *which,
                side,
            };
        }
        if id.starts_with(METADATA_PREFIX) {
            return FieldKind::MetadataBound {
                key: label.to_string(),
            };
        }
        if id.starts_with(CUSTOM_PREFIX) {
            return FieldKind::Custom;
        }
        FieldKind::Unknown
    }
}

/// Closed set of fonts a certificate can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Serif,
    Sans,
    Mono,
    /// Brand default, also the fallback for unknown names.
    Brand,
}

impl FontFamily {
    pub const ALL: [FontFamily; 4] = [
        FontFamily::Serif,
        FontFamily::Sans,
        FontFamily::Mono,
        FontFamily::Brand,
    ];

    /// Display name stored in templates.
    pub fn name(self) -> &'static str {
        match self {
            FontFamily::Serif => "Playfair Display",
            FontFamily::Sans => "Montserrat",
            FontFamily::Mono => "Courier Prime",
            FontFamily::Brand => "Inter",
        }
    }

    /// Bold face file name looked up in the fonts directory.
    pub fn bold_file(self) -> &'static str {
        match self {
            FontFamily::Serif => "PlayfairDisplay-Bold.ttf",
            FontFamily::Sans => "Montserrat-Bold.ttf",
            FontFamily::Mono => "CourierPrime-Bold.ttf",
            FontFamily::Brand => "Inter-Bold.ttf",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            FontFamily::Serif => "serif",
            FontFamily::Sans => "sans",
            FontFamily::Mono => "mono",
            FontFamily::Brand => "brand",
        }
    }

    /// Resolve a stored family name. Unknown names fall back to the brand
    /// font; the second value is `true` when that happened.
    pub fn resolve(name: &str) -> (FontFamily, bool) {
        let wanted = name.trim();
        FontFamily::ALL
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted) || f.alias().eq_ignore_ascii_case(wanted))
            .map(|f| (*f, false))
            .unwrap_or((FontFamily::Brand, true))
    }
}

/// One placeable text element on one page of the certificate.
///
/// `x` and `y` are percentages of the page size and locate the visual
/// center of the text. `font_size` is in pixels at the native page width.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    id: String,
    label: String,
    pub page: Page,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub color: String,
    pub font_family: String,
    pub visible: bool,
    /// Editor sample text; never used when rendering bound data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip)]
    kind: FieldKind,
}

impl Field {
    /// New visible field centered on the page with the default style.
    pub fn new(id: impl Into<String>, label: impl Into<String>, page: Page) -> Self {
        let id = id.into();
        let label = label.into();
        let kind = FieldKind::classify(&id, &label);
        Self {
            id,
            label,
            page,
            x: 50.0,
            y: 50.0,
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_COLOR.to_string(),
            font_family: FontFamily::Brand.name().to_string(),
            visible: true,
            value: None,
            kind,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = clamp_percent(x);
        self.y = clamp_percent(y);
        self
    }

    pub fn sized(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Same field under another id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self.kind = FieldKind::classify(&self.id, &self.label);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Rename the field. For metadata fields the label is the lookup key,
    /// so this rebinds the field to a different key.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
        self.kind = FieldKind::classify(&self.id, &self.label);
    }

    /// Resolved font family and whether it was a fallback.
    pub fn family(&self) -> (FontFamily, bool) {
        FontFamily::resolve(&self.font_family)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        super::legacy::field_from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("field must be an object with an id"))
    }
}

/// Clamp a percentage coordinate into `[0, 100]`. NaN lands on the center.
pub fn clamp_percent(v: f32) -> f32 {
    if v.is_nan() { 50.0 } else { v.clamp(0.0, 100.0) }
}
