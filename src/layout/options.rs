// src/layout/options.rs

use serde::Deserialize;

/// Vertical distance between two consecutive levels.
pub const LEVEL_HEIGHT: f64 = 120.0;

/// Horizontal spacing between neighbours before label-width adjustment.
pub const BASE_WIDTH: f64 = 80.0;

/// Extra horizontal spacing per character of the longest node name.
pub const WIDTH_PER_CHAR: f64 = 5.0;

/// Tunables for the layout engine.
///
/// Mirrors the optional `[layout]` section of the config file:
///
/// ```toml
/// [layout]
/// landscape = true
/// level_height = 150.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Lay levels out left-to-right instead of top-to-bottom.
    pub landscape: bool,
    pub level_height: f64,
    pub base_width: f64,
    pub width_per_char: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            landscape: false,
            level_height: LEVEL_HEIGHT,
            base_width: BASE_WIDTH,
            width_per_char: WIDTH_PER_CHAR,
        }
    }
}

impl LayoutOptions {
    pub fn landscape(mut self, landscape: bool) -> Self {
        self.landscape = landscape;
        self
    }

    /// Horizontal spacing used on every level for a graph whose longest
    /// node name has `longest_name_len` characters.
    pub fn level_width(&self, longest_name_len: usize) -> f64 {
        self.base_width + longest_name_len as f64 * self.width_per_char
    }
}
