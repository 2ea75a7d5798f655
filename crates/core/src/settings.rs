//! Presentation-wide style settings.

use crate::model::Rgb;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Settings for the final style normalization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSettings {
    /// Run the normalization pass at all. Default `true`.
    pub enabled: bool,
    /// Font applied to every run. Default Microsoft YaHei.
    pub default_font_name: String,
    /// Title size in points before clamping. Default 28.
    pub title_font_size: f64,
    /// Default 24.
    pub min_title_font_size: f64,
    /// Default 30.
    pub max_title_font_size: f64,
    /// Give every title the same color. Default `true`.
    pub unify_title_color: bool,
    /// Explicit title color; when unset and unifying, the first title color
    /// found in the deck is used. Default `None`.
    pub title_color_rgb: Option<Rgb>,
    /// Collapse title paragraphs to a single line. Default `true`.
    pub enforce_title_single_line: bool,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_font_name: "微软雅黑".to_string(),
            title_font_size: 28.0,
            min_title_font_size: 24.0,
            max_title_font_size: 30.0,
            unify_title_color: true,
            title_color_rgb: None,
            enforce_title_single_line: true,
        }
    }
}

/// A `normalize_style` change: every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_title_font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_title_font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unify_title_color: Option<bool>,
    /// Absent keeps the current color, `null` clears it.
    #[serde(
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub title_color_rgb: Option<Option<Rgb>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce_title_single_line: Option<bool>,
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl StyleSettings {
    /// Apply overrides in order, later values winning, then validate.
    pub fn merged<'a, I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a StyleOverrides>,
    {
        let mut settings = Self::default();
        for o in overrides {
            settings.apply(o);
        }
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&mut self, o: &StyleOverrides) {
        if let Some(v) = o.enabled {
            self.enabled = v;
        }
        if let Some(v) = &o.default_font_name {
            self.default_font_name = v.clone();
        }
        if let Some(v) = o.title_font_size {
            self.title_font_size = v;
        }
        if let Some(v) = o.min_title_font_size {
            self.min_title_font_size = v;
        }
        if let Some(v) = o.max_title_font_size {
            self.max_title_font_size = v;
        }
        if let Some(v) = o.unify_title_color {
            self.unify_title_color = v;
        }
        if let Some(v) = o.title_color_rgb {
            self.title_color_rgb = v;
        }
        if let Some(v) = o.enforce_title_single_line {
            self.enforce_title_single_line = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("title_font_size", self.title_font_size),
            ("min_title_font_size", self.min_title_font_size),
            ("max_title_font_size", self.max_title_font_size),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Payload(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.min_title_font_size > self.max_title_font_size {
            return Err(Error::Payload(format!(
                "min_title_font_size {} exceeds max_title_font_size {}",
                self.min_title_font_size, self.max_title_font_size
            )));
        }
        if self.default_font_name.trim().is_empty() {
            return Err(Error::Payload("default_font_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Title size clamped into `[min, max]`.
    pub fn clamped_title_size(&self) -> f64 {
        self.title_font_size
            .clamp(self.min_title_font_size, self.max_title_font_size)
    }
}
