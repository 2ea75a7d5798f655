//! The modification payload.
//!
//! A payload is a JSON array of per-slide entries, each carrying a target
//! category and a list of changes tagged by `type`:
//!
//! ```json
//! [{"slide_index": 1, "target_type": "title",
//!   "changes": [{"type": "replace_by_index", "paragraph_index": 0,
//!                "old_text": "Draft", "new_text": "Final"}]}]
//! ```

use crate::normalize::MatchMode;
use crate::settings::StyleOverrides;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Which part of a slide an entry's changes address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Title,
    #[default]
    Content,
    Style,
}

/// Treat `null` like a missing string.
fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Replace a paragraph addressed by its index.
///
/// For titles the index is ignored and the title's first significant
/// paragraph is targeted; for content it is the global content index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceByIndex {
    #[serde(default)]
    pub paragraph_index: Option<i64>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub old_text: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub new_text: String,
    #[serde(default)]
    pub match_mode: MatchMode,
}

/// Replace a paragraph addressed by shape and in-shape position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceByShapeParagraph {
    #[serde(default)]
    pub shape_index: Option<i64>,
    #[serde(default)]
    pub paragraph_index_in_shape: Option<i64>,
    #[serde(default)]
    pub nonempty_index_in_shape: Option<i64>,
    /// Only used to order changes.
    #[serde(default)]
    pub paragraph_index: Option<i64>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub old_text: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub new_text: String,
    #[serde(default)]
    pub match_mode: MatchMode,
}

/// Legacy whole-shape substring replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceText {
    pub old_text: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub new_text: String,
}

/// Insert a text box. Geometry in inches, font size in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTextbox {
    #[serde(default = "default_left")]
    pub left: f64,
    #[serde(default = "default_top")]
    pub top: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    pub text: String,
    /// Points, within the range a run size can hold.
    #[serde(default = "default_font_size", deserialize_with = "checked_font_size")]
    pub font_size: f64,
}

fn default_left() -> f64 {
    1.0
}

fn default_top() -> f64 {
    1.0
}

fn default_width() -> f64 {
    5.0
}

fn default_height() -> f64 {
    1.0
}

fn default_font_size() -> f64 {
    18.0
}

/// Run sizes are stored in hundredths of a point, from 100 to 400000.
pub const MIN_FONT_SIZE: f64 = 1.0;
pub const MAX_FONT_SIZE: f64 = 4000.0;

fn checked_font_size<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let size = f64::deserialize(deserializer)?;
    if size.is_finite() && (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(serde::de::Error::custom(format!(
            "font_size must be between {} and {} points, got {}",
            MIN_FONT_SIZE, MAX_FONT_SIZE, size
        )))
    }
}

/// Remove every top-level text shape containing `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteShape {
    pub text: String,
}

/// One change within a slide entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    ReplaceByIndex(ReplaceByIndex),
    ReplaceByShapeParagraph(ReplaceByShapeParagraph),
    ReplaceText(ReplaceText),
    AddTextbox(AddTextbox),
    DeleteShape(DeleteShape),
    NormalizeStyle(StyleOverrides),
    /// Any other `type`; skipped with a warning.
    #[serde(other)]
    Unsupported,
}

impl Change {
    /// Declared paragraph index used to order changes within a slide.
    pub fn order_key(&self) -> i64 {
        match self {
            Change::ReplaceByIndex(c) => c.paragraph_index.unwrap_or(0),
            Change::ReplaceByShapeParagraph(c) => c.paragraph_index.unwrap_or(0),
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Change::ReplaceByIndex(_) => "replace_by_index",
            Change::ReplaceByShapeParagraph(_) => "replace_by_shape_paragraph",
            Change::ReplaceText(_) => "replace_text",
            Change::AddTextbox(_) => "add_textbox",
            Change::DeleteShape(_) => "delete_shape",
            Change::NormalizeStyle(_) => "normalize_style",
            Change::Unsupported => "unsupported",
        }
    }
}

/// The changes for one slide and target category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideModification {
    /// 1-based slide number.
    #[serde(default)]
    pub slide_index: Option<i64>,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A whole modification payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModificationRequest {
    pub entries: Vec<SlideModification>,
}

impl ModificationRequest {
    pub fn new(entries: Vec<SlideModification>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every `normalize_style` change of every style entry, in payload order.
    pub fn style_overrides(&self) -> impl Iterator<Item = &StyleOverrides> {
        self.entries
            .iter()
            .filter(|entry| entry.target_type == TargetType::Style)
            .flat_map(|entry| entry.changes.iter())
            .filter_map(|change| match change {
                Change::NormalizeStyle(overrides) => Some(overrides),
                _ => None,
            })
    }
}
