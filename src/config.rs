use serde::{Deserialize, Serialize};

use crate::drawing::options::LengthDisplay;
use crate::error::PersistenceResult;

/// Which point coordinate drives the horizontal projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// Project through the bar index (works for whitespace and future bars)
    #[default]
    Logical,
    /// Project through the bar time; points without a time are unresolved
    Time,
}

/// Per-toolbox settings.
///
/// Missing keys fall back to the defaults, so a stored config written by an
/// older version still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolboxConfig {
    /// Hit-test and handle pick distance in pixels
    pub tolerance: f32,
    /// Whether `Delete` removes the hovered drawing
    pub enable_delete_hotkey: bool,
    /// Length label mode for newly created measurements
    pub measure_length_display: LengthDisplay,
    pub axis_mode: AxisMode,
    /// Radius of the hover handle markers
    pub handle_radius: f32,
    /// Lifecycle channel for measurements created through the toolbox
    pub measure_callback: Option<String>,
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            enable_delete_hotkey: true,
            measure_length_display: LengthDisplay::Both,
            axis_mode: AxisMode::Logical,
            handle_radius: 4.0,
            measure_callback: None,
        }
    }
}

impl ToolboxConfig {
    pub fn from_json_str(json: &str) -> PersistenceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
