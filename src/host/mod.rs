//! Capabilities the charting surface lends to the drawing engine.
//!
//! The engine never owns chart data or scales. Everything it needs from the
//! chart goes through [`ChartHost`], which is passed by reference into each
//! pointer, key and paint call.

mod context;
pub mod linear;

pub use context::{CursorStyle, InstanceId, SharedContext};
pub use linear::LinearScale;

use crate::point::{Logical, Point, Timestamp};

/// Coordinate conversion and scroll control provided by the chart.
///
/// Every conversion returns `None` when the value lies outside the window the
/// chart can currently project.
pub trait ChartHost {
    fn logical_to_x(&self, logical: Logical) -> Option<f32>;

    fn x_to_logical(&self, x: f32) -> Option<Logical>;

    fn price_to_y(&self, price: f64) -> Option<f32>;

    fn y_to_price(&self, y: f32) -> Option<f64>;

    fn time_to_x(&self, time: Timestamp) -> Option<f32>;

    /// Time of the bar at `logical`, if the series has one there
    fn logical_to_time(&self, logical: Logical) -> Option<Timestamp>;

    /// Toggle the chart's own pan/scroll handling
    fn set_scroll_enabled(&mut self, enabled: bool);

    /// Chart position under a pixel, or `None` outside the projectable window
    fn point_at(&self, pos: egui::Pos2) -> Option<Point> {
        let logical = self.x_to_logical(pos.x)?;
        let price = self.y_to_price(pos.y)?;
        Some(Point::new(self.logical_to_time(logical), logical, price))
    }
}
