use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DrawingKind;
use crate::config::ToolboxConfig;

pub const DEFAULT_LINE_COLOR: &str = "#1E80F0";
pub const DEFAULT_BOX_FILL: &str = "rgba(255, 255, 255, 0.2)";
pub const DEFAULT_MEASURE_FILL: &str = "rgba(255, 255, 255, 0.0)";
pub const DEFAULT_SPAN_COLOR: &str = "rgba(252, 219, 3, 0.2)";

/// Stroke pattern, stored as the chart library's integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
    Dashed,
    LargeDashed,
    SparseDotted,
}

impl TryFrom<u8> for LineStyle {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Solid),
            1 => Ok(Self::Dotted),
            2 => Ok(Self::Dashed),
            3 => Ok(Self::LargeDashed),
            4 => Ok(Self::SparseDotted),
            other => Err(format!("unknown line style {other}")),
        }
    }
}

impl From<LineStyle> for u8 {
    fn from(style: LineStyle) -> Self {
        match style {
            LineStyle::Solid => 0,
            LineStyle::Dotted => 1,
            LineStyle::Dashed => 2,
            LineStyle::LargeDashed => 3,
            LineStyle::SparseDotted => 4,
        }
    }
}

impl LineStyle {
    /// Dash and gap lengths in pixels for a given line width, `None` when solid
    pub fn dash_pattern(self, width: f32) -> Option<(f32, f32)> {
        let w = width.max(1.0);
        match self {
            Self::Solid => None,
            Self::Dotted => Some((w, w)),
            Self::Dashed => Some((2.0 * w, 2.0 * w)),
            Self::LargeDashed => Some((6.0 * w, 6.0 * w)),
            Self::SparseDotted => Some((w, 4.0 * w)),
        }
    }
}

/// What the measurement's length label shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthDisplay {
    Time,
    Bars,
    #[default]
    Both,
}

/// Options for the line-like variants and the vertical span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineOptions {
    pub line_color: String,
    pub line_style: LineStyle,
    pub width: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxOptions {
    pub line_color: String,
    pub line_style: LineStyle,
    pub width: f32,
    pub fill_enabled: bool,
    pub fill_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureOptions {
    pub line_color: String,
    pub line_style: LineStyle,
    pub width: f32,
    pub fill_enabled: bool,
    pub fill_color: String,
    pub length_display: LengthDisplay,
}

/// Fully populated style of one drawing
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingOptions {
    Line(LineOptions),
    Box(BoxOptions),
    Measure(MeasureOptions),
}

impl DrawingOptions {
    /// The complete default option set of a variant
    pub fn defaults_for(kind: DrawingKind, config: &ToolboxConfig) -> Self {
        let line = |color: &str, width: f32| LineOptions {
            line_color: color.to_owned(),
            line_style: LineStyle::Solid,
            width,
            text: String::new(),
        };

        match kind {
            DrawingKind::HorizontalLine | DrawingKind::RayLine | DrawingKind::VerticalLine => {
                Self::Line(line(DEFAULT_LINE_COLOR, 2.0))
            }
            DrawingKind::TrendLine => Self::Line(line(DEFAULT_LINE_COLOR, 4.0)),
            DrawingKind::VerticalSpan => Self::Line(line(DEFAULT_SPAN_COLOR, 0.0)),
            DrawingKind::Box => Self::Box(BoxOptions {
                line_color: DEFAULT_LINE_COLOR.to_owned(),
                line_style: LineStyle::Solid,
                width: 4.0,
                fill_enabled: true,
                fill_color: DEFAULT_BOX_FILL.to_owned(),
            }),
            DrawingKind::Measure => Self::Measure(MeasureOptions {
                line_color: DEFAULT_LINE_COLOR.to_owned(),
                line_style: LineStyle::Solid,
                width: 1.0,
                fill_enabled: true,
                fill_color: DEFAULT_MEASURE_FILL.to_owned(),
                length_display: config.measure_length_display,
            }),
        }
    }

    /// Defaults of `kind` with the keys of `patch` laid over them.
    ///
    /// Keys whose values do not fit the option type are dropped and logged;
    /// the result always carries every default key.
    pub fn from_partial(kind: DrawingKind, patch: &Value, config: &ToolboxConfig) -> Self {
        Self::defaults_for(kind, config).merged(patch)
    }

    /// A copy with the keys of `patch` laid over the current values
    pub fn merged(&self, patch: &Value) -> Self {
        match self {
            Self::Line(o) => Self::Line(merge_keys(o, patch)),
            Self::Box(o) => Self::Box(merge_keys(o, patch)),
            Self::Measure(o) => Self::Measure(merge_keys(o, patch)),
        }
    }

    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::Line(o) => serde_json::to_value(o),
            Self::Box(o) => serde_json::to_value(o),
            Self::Measure(o) => serde_json::to_value(o),
        };
        // Plain structs of strings and numbers always serialize
        value.unwrap_or(Value::Null)
    }

    pub fn line_color(&self) -> &str {
        match self {
            Self::Line(o) => &o.line_color,
            Self::Box(o) => &o.line_color,
            Self::Measure(o) => &o.line_color,
        }
    }

    pub fn line_style(&self) -> LineStyle {
        match self {
            Self::Line(o) => o.line_style,
            Self::Box(o) => o.line_style,
            Self::Measure(o) => o.line_style,
        }
    }

    pub fn width(&self) -> f32 {
        match self {
            Self::Line(o) => o.width,
            Self::Box(o) => o.width,
            Self::Measure(o) => o.width,
        }
    }

    pub fn as_measure(&self) -> Option<&MeasureOptions> {
        match self {
            Self::Measure(o) => Some(o),
            _ => None,
        }
    }
}

fn merge_keys<T>(base: &T, patch: &Value) -> T
where
    T: Serialize + DeserializeOwned + Clone,
{
    let patch = match patch {
        Value::Object(map) => map,
        Value::Null => return base.clone(),
        other => {
            warn!("Ignoring non-object options: {other}");
            return base.clone();
        }
    };

    let mut merged: Map<String, Value> = match serde_json::to_value(base) {
        Ok(Value::Object(map)) => map,
        _ => return base.clone(),
    };

    for (key, value) in patch {
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value.clone());
        match serde_json::from_value::<T>(Value::Object(candidate.clone())) {
            Ok(_) => merged = candidate,
            Err(e) => warn!("Dropping option {key}={value}: {e}"),
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| base.clone())
}
