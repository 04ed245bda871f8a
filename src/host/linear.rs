use std::ops::RangeInclusive;

use egui::Rect;

use super::ChartHost;
use crate::point::{Logical, Timestamp};

/// Evenly spaced bars over a linear price axis.
///
/// Backs the demo chart and serves as a deterministic host in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    rect: Rect,
    /// Logical index at the left edge of `rect`, fractional while panning
    first_logical: f64,
    bar_spacing: f32,
    price_bottom: f64,
    price_top: f64,
    base_time: Timestamp,
    interval: i64,
    bar_count: i64,
    projectable: RangeInclusive<Logical>,
    scroll_enabled: bool,
}

impl LinearScale {
    pub fn new(rect: Rect, first_logical: f64, bar_spacing: f32, prices: (f64, f64)) -> Self {
        Self {
            rect,
            first_logical,
            bar_spacing: bar_spacing.max(0.1),
            price_bottom: prices.0,
            price_top: prices.1,
            base_time: 0,
            interval: 60,
            bar_count: 0,
            projectable: -100_000..=100_000,
            scroll_enabled: true,
        }
    }

    /// Bars `0..bar_count` exist, opening at `base_time + i * interval`
    pub fn with_series(mut self, base_time: Timestamp, interval: i64, bar_count: i64) -> Self {
        self.base_time = base_time;
        self.interval = interval.max(1);
        self.bar_count = bar_count.max(0);
        self
    }

    /// Restrict the logical indices the scale will turn into pixels
    pub fn with_projectable(mut self, range: RangeInclusive<Logical>) -> Self {
        self.projectable = range;
        self
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn bar_spacing(&self) -> f32 {
        self.bar_spacing
    }

    pub fn scroll_enabled(&self) -> bool {
        self.scroll_enabled
    }

    pub fn set_price_range(&mut self, bottom: f64, top: f64) {
        self.price_bottom = bottom;
        self.price_top = top;
    }

    /// Shift the view by a pixel distance; ignored while scrolling is disabled.
    /// Returns whether the visible range changed.
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        if !self.scroll_enabled || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.first_logical -= f64::from(dx / self.bar_spacing);
        let per_pixel = (self.price_top - self.price_bottom) / f64::from(self.rect.height().max(1.0));
        self.price_top += f64::from(dy) * per_pixel;
        self.price_bottom += f64::from(dy) * per_pixel;
        true
    }

    /// Scale bar spacing around the pixel column `anchor_x`
    pub fn zoom(&mut self, factor: f32, anchor_x: f32) -> bool {
        if !self.scroll_enabled || factor <= 0.0 || factor == 1.0 {
            return false;
        }
        let anchor = self.fractional_logical(anchor_x);
        self.bar_spacing = (self.bar_spacing * factor).clamp(1.0, 200.0);
        self.first_logical = anchor - f64::from((anchor_x - self.rect.left()) / self.bar_spacing);
        true
    }

    /// Logical range covered by the plot rect
    pub fn visible_logicals(&self) -> RangeInclusive<Logical> {
        let first = self.first_logical.floor() as Logical;
        let last = self.fractional_logical(self.rect.right()).ceil() as Logical;
        first..=last
    }

    fn fractional_logical(&self, x: f32) -> f64 {
        self.first_logical + f64::from((x - self.rect.left()) / self.bar_spacing)
    }
}

impl ChartHost for LinearScale {
    fn logical_to_x(&self, logical: Logical) -> Option<f32> {
        if !self.projectable.contains(&logical) {
            return None;
        }
        let offset = (logical as f64 - self.first_logical) as f32;
        Some(self.rect.left() + offset * self.bar_spacing)
    }

    fn x_to_logical(&self, x: f32) -> Option<Logical> {
        if !self.rect.x_range().contains(x) {
            return None;
        }
        let logical = self.fractional_logical(x).round() as Logical;
        self.projectable.contains(&logical).then_some(logical)
    }

    fn price_to_y(&self, price: f64) -> Option<f32> {
        let span = self.price_top - self.price_bottom;
        if !price.is_finite() || span == 0.0 {
            return None;
        }
        let offset = (self.price_top - price) * f64::from(self.rect.height()) / span;
        Some(self.rect.top() + offset as f32)
    }

    fn y_to_price(&self, y: f32) -> Option<f64> {
        if !self.rect.y_range().contains(y) || self.rect.height() <= 0.0 {
            return None;
        }
        let per_pixel = (self.price_top - self.price_bottom) / f64::from(self.rect.height());
        Some(self.price_top - f64::from(y - self.rect.top()) * per_pixel)
    }

    fn time_to_x(&self, time: Timestamp) -> Option<f32> {
        let offset = time - self.base_time;
        if offset % self.interval != 0 {
            return None;
        }
        self.logical_to_x(offset / self.interval)
    }

    fn logical_to_time(&self, logical: Logical) -> Option<Timestamp> {
        (0..self.bar_count)
            .contains(&logical)
            .then(|| self.base_time + logical * self.interval)
    }

    fn set_scroll_enabled(&mut self, enabled: bool) {
        self.scroll_enabled = enabled;
    }
}
