//! Drawing data model: the closed set of variants, their points and options.

pub mod options;

use std::fmt;

use egui::Pos2;
use serde_json::Value;
use uuid::Uuid;

use crate::config::{AxisMode, ToolboxConfig};
use crate::error::DrawingError;
use crate::geometry::hit_testing;
use crate::host::ChartHost;
use crate::interaction::{self, Interaction, InteractionState};
use crate::point::{DragDelta, Point};
use crate::view::DrawingView;

pub use options::{DrawingOptions, LengthDisplay, LineStyle};

/// Runtime identity of a live drawing; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawingId(Uuid);

impl DrawingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DrawingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Variant discriminator, also the persisted type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawingKind {
    HorizontalLine,
    RayLine,
    VerticalLine,
    TrendLine,
    Box,
    VerticalSpan,
    Measure,
}

impl DrawingKind {
    pub const ALL: [DrawingKind; 7] = [
        DrawingKind::HorizontalLine,
        DrawingKind::RayLine,
        DrawingKind::VerticalLine,
        DrawingKind::TrendLine,
        DrawingKind::Box,
        DrawingKind::VerticalSpan,
        DrawingKind::Measure,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::HorizontalLine => "HorizontalLine",
            Self::RayLine => "RayLine",
            Self::VerticalLine => "VerticalLine",
            Self::TrendLine => "TrendLine",
            Self::Box => "Box",
            Self::VerticalSpan => "VerticalSpan",
            Self::Measure => "Measure",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn point_count(self) -> usize {
        match self {
            Self::HorizontalLine | Self::RayLine | Self::VerticalLine => 1,
            Self::TrendLine | Self::Box | Self::VerticalSpan | Self::Measure => 2,
        }
    }

    pub fn is_two_point(self) -> bool {
        self.point_count() == 2
    }

    /// Whether the variant reacts to hover and drag at all
    pub fn is_interactive(self) -> bool {
        !matches!(self, Self::VerticalSpan)
    }

    fn accepts(self, options: &DrawingOptions) -> bool {
        matches!(
            (self, options),
            (
                Self::HorizontalLine
                    | Self::RayLine
                    | Self::VerticalLine
                    | Self::TrendLine
                    | Self::VerticalSpan,
                DrawingOptions::Line(_)
            ) | (Self::Box, DrawingOptions::Box(_))
                | (Self::Measure, DrawingOptions::Measure(_))
        )
    }
}

impl fmt::Display for DrawingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Lifecycle notification kinds of callback-bound drawings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Created,
    Updated,
    Deleted,
}

impl LifecycleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// One lifecycle message waiting to be sent on its callback channel
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub callback: String,
    pub kind: LifecycleKind,
    pub points: Vec<Point>,
}

/// A live annotation.
///
/// The number of points is fixed by the variant and never changes, and the
/// options always carry the variant's full key set.
#[derive(Debug, Clone)]
pub struct Drawing {
    id: DrawingId,
    kind: DrawingKind,
    points: Vec<Point>,
    options: DrawingOptions,
    interaction: Interaction,
    view: DrawingView,
    callback: Option<String>,
}

impl Drawing {
    pub fn new(
        kind: DrawingKind,
        points: Vec<Point>,
        options: DrawingOptions,
    ) -> Result<Self, DrawingError> {
        if points.len() != kind.point_count() {
            return Err(DrawingError::PointCount {
                kind,
                expected: kind.point_count(),
                found: points.len(),
            });
        }
        if !kind.accepts(&options) {
            return Err(DrawingError::InvalidOptions {
                kind,
                reason: "option set belongs to another variant".to_owned(),
            });
        }
        Ok(Self {
            id: DrawingId::new(),
            kind,
            points,
            options,
            interaction: Interaction::default(),
            view: DrawingView::default(),
            callback: None,
        })
    }

    /// Build with caller options laid over the variant defaults
    pub fn from_partial(
        kind: DrawingKind,
        points: Vec<Point>,
        options: &Value,
        config: &ToolboxConfig,
    ) -> Result<Self, DrawingError> {
        Self::new(kind, points, DrawingOptions::from_partial(kind, options, config))
    }

    pub fn with_defaults(
        kind: DrawingKind,
        points: Vec<Point>,
        config: &ToolboxConfig,
    ) -> Result<Self, DrawingError> {
        Self::new(kind, points, DrawingOptions::defaults_for(kind, config))
    }

    /// Bind lifecycle notifications to an explicit channel name
    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    pub fn id(&self) -> DrawingId {
        self.id
    }

    pub fn kind(&self) -> DrawingKind {
        self.kind
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn options(&self) -> &DrawingOptions {
        &self.options
    }

    pub fn callback(&self) -> Option<&str> {
        self.callback.as_deref()
    }

    pub fn state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn hovered(&self) -> bool {
        self.interaction.hovered()
    }

    pub fn view(&self) -> &DrawingView {
        &self.view
    }

    /// Lay a partial option object over the current options
    pub fn apply_options(&mut self, patch: &Value) {
        self.options = self.options.merged(patch);
    }

    /// Replace points positionally; `None` entries keep the current point.
    /// Returns whether anything changed.
    pub fn update_points(&mut self, updates: &[Option<Point>]) -> bool {
        let mut changed = false;
        for (current, update) in self.points.iter_mut().zip(updates) {
            if let Some(point) = update {
                changed |= current != point;
                *current = *point;
            }
        }
        changed
    }

    pub fn update_view(&mut self, host: &dyn ChartHost, mode: AxisMode) {
        self.view.update(host, &self.points, mode);
    }

    pub fn hit_test(&self, pos: Pos2, tolerance: f32) -> bool {
        hit_testing::hit_test(self.kind, &self.view, pos, tolerance)
    }

    /// Projected corners handed to handle picking, two-point variants only
    pub fn handle_corners(&self) -> Option<(Pos2, Pos2)> {
        if self.kind.is_two_point() {
            self.view.resolved_pair()
        } else {
            None
        }
    }

    pub(crate) fn interaction_mut(&mut self) -> &mut Interaction {
        &mut self.interaction
    }

    /// Move the points targeted by the current drag state and re-derive
    /// their bar times.
    pub(crate) fn apply_drag(&mut self, delta: DragDelta, host: &dyn ChartHost) -> bool {
        if !interaction::apply_drag(self.interaction.state(), &mut self.points, delta) {
            return false;
        }
        for point in &mut self.points {
            point.time = host.logical_to_time(point.logical);
        }
        true
    }

    pub(crate) fn lifecycle(&self, kind: LifecycleKind) -> Option<LifecycleEvent> {
        self.callback.as_ref().map(|callback| LifecycleEvent {
            callback: callback.clone(),
            kind,
            points: self.points.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags_round_trip() {
        for kind in DrawingKind::ALL {
            assert_eq!(DrawingKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(DrawingKind::from_tag("Bogus"), None);
    }

    #[test]
    fn test_point_count_enforced() {
        let config = ToolboxConfig::default();
        let err = Drawing::with_defaults(DrawingKind::Box, vec![Point::at(1, 1.0)], &config)
            .unwrap_err();
        assert!(matches!(
            err,
            DrawingError::PointCount { expected: 2, found: 1, .. }
        ));
        assert!(Drawing::with_defaults(DrawingKind::RayLine, vec![Point::at(1, 1.0)], &config).is_ok());
    }

    #[test]
    fn test_options_family_enforced() {
        let config = ToolboxConfig::default();
        let box_options = DrawingOptions::defaults_for(DrawingKind::Box, &config);
        let result = Drawing::new(
            DrawingKind::Measure,
            vec![Point::at(1, 1.0), Point::at(2, 2.0)],
            box_options,
        );
        assert!(matches!(result, Err(DrawingError::InvalidOptions { .. })));
    }

    #[test]
    fn test_update_points_keeps_none_entries() {
        let config = ToolboxConfig::default();
        let mut drawing = Drawing::with_defaults(
            DrawingKind::TrendLine,
            vec![Point::at(1, 1.0), Point::at(2, 2.0)],
            &config,
        )
        .unwrap();
        assert!(drawing.update_points(&[None, Some(Point::at(5, 5.0))]));
        assert_eq!(drawing.points(), &[Point::at(1, 1.0), Point::at(5, 5.0)]);
        assert!(!drawing.update_points(&[Some(Point::at(1, 1.0))]));
    }

    #[test]
    fn test_apply_options_merges() {
        let config = ToolboxConfig::default();
        let mut drawing = Drawing::from_partial(
            DrawingKind::Box,
            vec![Point::at(1, 1.0), Point::at(2, 2.0)],
            &json!({"fillEnabled": false}),
            &config,
        )
        .unwrap();
        drawing.apply_options(&json!({"lineColor": "#000"}));
        let DrawingOptions::Box(options) = drawing.options() else {
            panic!("box options");
        };
        assert!(!options.fill_enabled);
        assert_eq!(options.line_color, "#000");
        assert_eq!(options.fill_color, options::DEFAULT_BOX_FILL);
    }

    #[test]
    fn test_lifecycle_requires_callback() {
        let config = ToolboxConfig::default();
        let points = vec![Point::at(1, 1.0), Point::at(2, 2.0)];
        let plain = Drawing::with_defaults(DrawingKind::Measure, points.clone(), &config).unwrap();
        assert!(plain.lifecycle(LifecycleKind::Created).is_none());

        let bound = plain.with_callback("measure_a");
        let event = bound.lifecycle(LifecycleKind::Deleted).unwrap();
        assert_eq!(event.callback, "measure_a");
        assert_eq!(event.points, points);
    }
}
