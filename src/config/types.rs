//! Configuration and stdin input types

use crate::core::cost::PricingOverride;
use serde::{Deserialize, Serialize};

/// ANSI color specification, configurable per element in the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnsiColor {
    Color16 { c16: u8 },
    Color256 { c256: u8 },
    Rgb { r: u8, g: u8, b: u8 },
}

/// Color assignments for the rendered lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    /// Color for the state label (default: Cyan)
    pub state: Option<AnsiColor>,
    /// Color for detail text (default: none)
    pub detail: Option<AnsiColor>,
    /// Color for dimmed text like elapsed times and counts (default: Gray)
    pub dim: Option<AnsiColor>,
    /// Color for the context-pressure warning (default: Red)
    pub alert: Option<AnsiColor>,
    /// Color for success/celebration (default: Green)
    pub success: Option<AnsiColor>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            state: Some(AnsiColor::Color16 { c16: 6 }),   // Cyan
            detail: None,
            dim: Some(AnsiColor::Color16 { c16: 8 }),     // Bright black (gray)
            alert: Some(AnsiColor::Color16 { c16: 1 }),   // Red
            success: Some(AnsiColor::Color16 { c16: 2 }), // Green
        }
    }
}

/// Display options for the statusline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum length for detail strings
    pub max_detail_len: usize,
    /// Whether to render the completed-tools summary line
    pub show_tools_line: bool,
    /// Whether to render the cost segment
    pub show_cost: bool,
    /// Whether to animate the state icon across invocations
    pub animate: bool,
    /// Color assignments
    pub colors: ColorScheme,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_detail_len: 28,
            show_tools_line: true,
            show_cost: true,
            animate: true,
            colors: ColorScheme::default(),
        }
    }
}

/// Top-level configuration loaded from `~/.claude/ccpulse/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    /// Partial pricing override; incomplete families are dropped at load
    /// time so the tracker only ever sees validated tables
    #[serde(default)]
    pub pricing: Option<PricingOverride>,
}

impl Config {
    /// Drop pricing override entries that are unusable (a family with only
    /// one of input/output specified). The tracker assumes a pre-validated
    /// partial table.
    pub fn sanitize(&mut self) {
        if let Some(pricing) = &mut self.pricing {
            for family in [&mut pricing.sonnet, &mut pricing.opus, &mut pricing.haiku] {
                if let Some(rates) = family {
                    if rates.input.is_none() || rates.output.is_none() {
                        *family = None;
                    }
                }
            }
        }
    }
}

/// Model identity as delivered by the agent CLI on stdin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// The JSON payload the agent CLI writes to our stdin on each poll
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputData {
    #[serde(default)]
    pub model: ModelInfo,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    /// Window size override; when absent the model config decides
    #[serde(default)]
    pub context_window_size: Option<u64>,
}
