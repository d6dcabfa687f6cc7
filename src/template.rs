//! Template descriptor types: positioned text fields, column mappings, data rows.
//!
//! All types derive `Serialize + Deserialize` so the same types work for both
//! Rust API construction and JSON deserialization (CLI descriptor files and
//! HTTP job requests use identical shapes).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Font style for a field. Bold and italic select distinct registered
/// faces; they are never layered onto the family name as modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
}

/// Horizontal text alignment within a field's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement of the wrapped text block within a field's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

fn default_fill() -> String {
    "#000000".to_string()
}

/// One positioned, styled text placeholder on a template.
///
/// Coordinates are pixels with a top-left origin. When `width` and `height`
/// are both positive the font size is resolved by auto-fit with `font_size`
/// as the upper bound; otherwise `font_size` is used unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateField {
    pub id: String,
    /// Designer-facing label. Never rendered onto badges.
    #[serde(default)]
    pub text: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default = "TemplateField::default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub font_family: String,
    /// Hex color, e.g. "#1a2b3c".
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    /// Clockwise rotation in degrees about the field's top-left corner.
    #[serde(default)]
    pub rotation: f32,
}

impl TemplateField {
    fn default_font_size() -> f32 {
        20.0
    }

    /// True when both box dimensions are positive and auto-fit applies.
    pub fn has_box(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Association from [`TemplateField::id`] to a dataset column name.
///
/// Fields absent from the mapping are skipped during rendering: no
/// placeholder is drawn and no error is raised.
pub type FieldMapping = HashMap<String, String>;

/// One parsed spreadsheet row: column name → scalar value.
pub type DataRow = HashMap<String, serde_json::Value>;

/// Resolve the text a field should render for one row.
///
/// Returns an empty string when the field is unmapped, the column is absent,
/// or the value is null; callers treat empty as "skip this field".
pub fn resolve_value(field: &TemplateField, mapping: &FieldMapping, row: &DataRow) -> String {
    let Some(column) = mapping.get(&field.id) else {
        return String::new();
    };
    match row.get(column) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
