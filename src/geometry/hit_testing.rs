use egui::{Pos2, Rect};

use crate::drawing::DrawingKind;
use crate::interaction::Handle;
use crate::view::DrawingView;

/// Axis-aligned rectangle spanned by two points, grown by `tolerance / 2`
pub fn padded_bounds(p1: Pos2, p2: Pos2, tolerance: f32) -> Rect {
    Rect::from_two_pos(p1, p2).expand(tolerance / 2.0)
}

pub fn over_rect(pos: Pos2, p1: Pos2, p2: Pos2, tolerance: f32) -> bool {
    padded_bounds(p1, p2, tolerance).contains(pos)
}

/// Distance from `point` to the segment `start..end`
pub fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let line = end - start;
    let len_sq = line.length_sq();
    if len_sq == 0.0 {
        return point.distance(start);
    }
    let t = ((point - start).dot(line) / len_sq).clamp(0.0, 1.0);
    point.distance(start + line * t)
}

/// Handle under `pos`, checked in the fixed order one, two, three, four.
///
/// A handle matches when the pointer is within `tolerance` of it on both
/// axes.
pub fn pick_handle(pos: Pos2, p1: Pos2, p2: Pos2, tolerance: f32) -> Option<Handle> {
    let near = |x: f32, y: f32| (pos.x - x).abs() < tolerance && (pos.y - y).abs() < tolerance;

    Handle::ORDER.into_iter().find(|handle| match handle {
        Handle::One => near(p1.x, p1.y),
        Handle::Two => near(p2.x, p2.y),
        Handle::Three => near(p1.x, p2.y),
        Handle::Four => near(p2.x, p1.y),
    })
}

/// Corner positions of the box spanned by two points, clockwise from top-left
pub fn box_corners(p1: Pos2, p2: Pos2) -> [Pos2; 4] {
    let rect = Rect::from_two_pos(p1, p2);
    [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ]
}

/// Whether `pos` is over the drawing's projected shape.
///
/// Unresolved coordinates never hit.
pub fn hit_test(kind: DrawingKind, view: &DrawingView, pos: Pos2, tolerance: f32) -> bool {
    let half = tolerance / 2.0;
    match kind {
        DrawingKind::HorizontalLine => view
            .first()
            .y
            .is_some_and(|y| (pos.y - y).abs() <= half),
        DrawingKind::RayLine => view
            .first()
            .pos()
            .is_some_and(|p| (pos.y - p.y).abs() <= half && pos.x >= p.x - half),
        DrawingKind::VerticalLine => view
            .first()
            .x
            .is_some_and(|x| (pos.x - x).abs() <= half),
        DrawingKind::TrendLine => view.resolved_pair().is_some_and(|(p1, p2)| {
            over_rect(pos, p1, p2, tolerance) && distance_to_segment(pos, p1, p2) <= half
        }),
        DrawingKind::Box | DrawingKind::Measure => view
            .resolved_pair()
            .is_some_and(|(p1, p2)| over_rect(pos, p1, p2, tolerance)),
        DrawingKind::VerticalSpan => false,
    }
}
