//! Projection of logical points into pixel space.
//!
//! A [`DrawingView`] is refreshed once per redraw request and then read by
//! hit testing and the renderer, which never convert coordinates themselves.

use egui::Pos2;

use crate::config::AxisMode;
use crate::host::ChartHost;
use crate::point::Point;

/// Pixel position of one point; each axis is `None` when unprojectable
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewPoint {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl ViewPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    pub const UNRESOLVED: Self = Self { x: None, y: None };

    /// Both axes resolved
    pub fn pos(&self) -> Option<Pos2> {
        Some(Pos2::new(self.x?, self.y?))
    }
}

impl From<Pos2> for ViewPoint {
    fn from(pos: Pos2) -> Self {
        Self::new(pos.x, pos.y)
    }
}

/// Project one logical point through the host
pub fn project(host: &dyn ChartHost, point: &Point, mode: AxisMode) -> ViewPoint {
    let x = match mode {
        AxisMode::Logical => host.logical_to_x(point.logical),
        AxisMode::Time => point.time.and_then(|t| host.time_to_x(t)),
    };
    ViewPoint {
        x,
        y: host.price_to_y(point.price),
    }
}

/// Cached pixel coordinates of a drawing's points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingView {
    points: Vec<ViewPoint>,
}

impl DrawingView {
    pub fn from_points(points: Vec<ViewPoint>) -> Self {
        Self { points }
    }

    pub fn update(&mut self, host: &dyn ChartHost, points: &[Point], mode: AxisMode) {
        self.points.clear();
        self.points
            .extend(points.iter().map(|p| project(host, p, mode)));
    }

    pub fn points(&self) -> &[ViewPoint] {
        &self.points
    }

    pub fn first(&self) -> ViewPoint {
        self.points.first().copied().unwrap_or(ViewPoint::UNRESOLVED)
    }

    pub fn second(&self) -> ViewPoint {
        self.points.get(1).copied().unwrap_or(ViewPoint::UNRESOLVED)
    }

    /// Both points of a two-point drawing, if fully resolved
    pub fn resolved_pair(&self) -> Option<(Pos2, Pos2)> {
        Some((self.first().pos()?, self.second().pos()?))
    }
}
