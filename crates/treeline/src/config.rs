//! View configuration and palette.
//!
//! [`ViewConfig`] holds the metrics and timing thresholds of a
//! [`ColumnTreeView`](crate::widget::ColumnTreeView). It is plain data that
//! round-trips through TOML, so hosts can keep it in a settings file:
//!
//! ```
//! use treeline::ViewConfig;
//!
//! let config = ViewConfig::from_toml_str("row_height = 24.0\ndrag_threshold = 3.0").unwrap();
//! assert_eq!(config.row_height, 24.0);
//! assert_eq!(config.header_height, 24.0); // unspecified fields keep their defaults
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use treeline_render::Color;

use crate::error::{ViewError, ViewResult};

/// Metrics and thresholds for a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Height used for rows whose item reports no height.
    pub row_height: f32,
    /// Height of the header strip. Zero hides it.
    pub header_height: f32,
    /// Horizontal indentation per tree level.
    pub indent_width: f32,
    /// Width of the expand/collapse glyph area.
    pub expander_width: f32,
    /// Manhattan distance the pointer must travel after a press to start a drag.
    pub drag_threshold: f32,
    /// Double-click interval used when the host does not supply one.
    pub double_click_interval_ms: u64,
    /// Tallest drag preview before it is cropped and faded.
    pub max_drag_preview_height: u32,
    /// Height of the fade applied to a cropped preview's bottom edge.
    pub drag_preview_fade_height: u32,
    /// Width of the grab zone around a header's right edge.
    pub resize_grip_width: f32,
    /// Narrowest a column can be resized to.
    pub min_column_width: f32,
    /// Width given to columns added without one.
    pub default_column_width: f32,
    /// Pause after which type-ahead starts a new search string.
    pub type_ahead_timeout_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            row_height: 20.0,
            header_height: 24.0,
            indent_width: 16.0,
            expander_width: 12.0,
            drag_threshold: 2.0,
            double_click_interval_ms: 500,
            max_drag_preview_height: 200,
            drag_preview_fade_height: 48,
            resize_grip_width: 5.0,
            min_column_width: 20.0,
            default_column_width: 100.0,
            type_ahead_timeout_ms: 1000,
        }
    }
}

impl ViewConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> ViewResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ViewResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the view cannot work with.
    pub fn validate(&self) -> ViewResult<()> {
        let positive = [
            ("row_height", self.row_height),
            ("min_column_width", self.min_column_width),
            ("default_column_width", self.default_column_width),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ViewError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("header_height", self.header_height),
            ("indent_width", self.indent_width),
            ("expander_width", self.expander_width),
            ("drag_threshold", self.drag_threshold),
            ("resize_grip_width", self.resize_grip_width),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ViewError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        if self.default_column_width < self.min_column_width {
            return Err(ViewError::InvalidConfig(format!(
                "default_column_width ({}) is below min_column_width ({})",
                self.default_column_width, self.min_column_width
            )));
        }
        if self.drag_preview_fade_height > self.max_drag_preview_height {
            return Err(ViewError::InvalidConfig(format!(
                "drag_preview_fade_height ({}) exceeds max_drag_preview_height ({})",
                self.drag_preview_fade_height, self.max_drag_preview_height
            )));
        }
        Ok(())
    }

    pub fn double_click_interval(&self) -> Duration {
        Duration::from_millis(self.double_click_interval_ms)
    }

    pub fn type_ahead_timeout(&self) -> Duration {
        Duration::from_millis(self.type_ahead_timeout_ms)
    }
}

/// Colours used when painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewStyle {
    pub background: Color,
    pub text: Color,
    pub selected_background: Color,
    pub selected_text: Color,
    pub hover_background: Color,
    pub current_outline: Color,
    pub header_background: Color,
    pub header_pressed: Color,
    pub header_text: Color,
    pub grid_line: Color,
    pub expander: Color,
    pub drop_indicator: Color,
    pub text_size: f32,
}

impl Default for ViewStyle {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            text: Color::BLACK,
            selected_background: Color::from_rgb8(0x33, 0x66, 0xCC),
            selected_text: Color::WHITE,
            hover_background: Color::from_rgb8(0xE8, 0xF0, 0xFA),
            current_outline: Color::from_rgb8(0x33, 0x66, 0xCC),
            header_background: Color::LIGHT_GRAY,
            header_pressed: Color::GRAY,
            header_text: Color::BLACK,
            grid_line: Color::from_rgb8(0xC8, 0xC8, 0xC8),
            expander: Color::DARK_GRAY,
            drop_indicator: Color::from_rgb8(0x22, 0x55, 0xDD),
            text_size: 12.0,
        }
    }
}
