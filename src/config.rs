use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};
use crate::geometry::Rect;
use crate::overlay::DEFAULT_FORM_PREFIX;
use crate::text::DEFAULT_LINE_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Inch,
    Cm,
    Pt,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Inch => "in",
            UnitSystem::Cm => "cm",
            UnitSystem::Pt => "pt",
        }
    }

    pub fn to_points(&self, v: f64) -> f64 {
        match self {
            UnitSystem::Inch => v * 72.0,
            UnitSystem::Cm => v / 2.54 * 72.0,
            UnitSystem::Pt => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
}

/// How a text overlay is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_size: f32,
    /// baseline-to-baseline distance
    pub leading: f32,
    /// characters per line before wrapping
    pub line_length: usize,
    /// fill and stroke colour, 0..1 per channel
    pub color: [f32; 3],
    pub align: TextAlign,
    /// distance from the page edge to the text block
    pub margin: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_size: 12.0,
            leading: 14.4,
            line_length: DEFAULT_LINE_LENGTH,
            color: [0.0, 0.0, 0.0],
            align: TextAlign::Left,
            margin: 36.0,
        }
    }
}

/// Page size of a generated (text) overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
    pub unit: UnitSystem,
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize { width: 8.5, height: 11.0, unit: UnitSystem::Inch }
    }
}

impl PageSize {
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.unit.to_points(self.width) as f32,
            self.unit.to_points(self.height) as f32,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Resource name prefix of the overlay form
    pub form_name_prefix: String,
    pub text: TextStyle,
    pub page: PageSize,
}

impl Default for StampConfig {
    fn default() -> Self {
        StampConfig {
            form_name_prefix: DEFAULT_FORM_PREFIX.to_string(),
            text: TextStyle::default(),
            page: PageSize::default(),
        }
    }
}

impl StampConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<StampConfig> {
        if !path.exists() {
            return Err(OverlayError::MissingResource(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
