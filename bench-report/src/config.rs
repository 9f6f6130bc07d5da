//! Renderer configuration types
//!
//! The defaults reproduce the stock report layout; callers only need a
//! configuration to change the histogram bars.

use crate::histogram::{BAR_CHAR, BAR_WIDTH};
use serde::{Deserialize, Serialize};

/// Configuration for the report renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Length of the histogram bar for the fullest bucket (default: 40)
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Character repeated to draw histogram bars (default: '■')
    #[serde(default = "default_bar_char")]
    pub bar_char: char,
}

fn default_bar_width() -> usize {
    BAR_WIDTH
}

fn default_bar_char() -> char {
    BAR_CHAR
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            bar_char: default_bar_char(),
        }
    }
}

impl RenderConfig {
    /// Create a new render configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the histogram bar width
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    /// Builder method: set the histogram bar character
    pub fn with_bar_char(mut self, bar_char: char) -> Self {
        self.bar_char = bar_char;
        self
    }
}
