//! Per-drawing hover/drag state machine.
//!
//! Transitions only touch the outside world through [`Effects`], so tests can
//! observe exactly which feeds, cursors and scroll toggles a transition asks
//! for.

mod feeds;

pub use feeds::{EventFeeds, Feed, Subscriptions};

use egui::Pos2;
use log::debug;

use crate::drawing::DrawingId;
use crate::geometry::hit_testing::pick_handle;
use crate::host::{ChartHost, CursorStyle, SharedContext};
use crate::point::{DragDelta, Point};

/// Draggable control point of a two-point drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// First point
    One,
    /// Second point
    Two,
    /// First point's x with second point's y
    Three,
    /// Second point's x with first point's y
    Four,
}

impl Handle {
    /// Pick order when several handles are within reach
    pub const ORDER: [Handle; 4] = [Handle::One, Handle::Two, Handle::Three, Handle::Four];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering,
    /// Whole-shape translate
    Dragging,
    DraggingHandle(Handle),
}

impl InteractionState {
    pub fn is_dragging(self) -> bool {
        matches!(self, Self::Dragging | Self::DraggingHandle(_))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Hovering => "hovering",
            Self::Dragging => "dragging",
            Self::DraggingHandle(Handle::One) => "dragging_handle_1",
            Self::DraggingHandle(Handle::Two) => "dragging_handle_2",
            Self::DraggingHandle(Handle::Three) => "dragging_handle_3",
            Self::DraggingHandle(Handle::Four) => "dragging_handle_4",
        }
    }
}

/// Outside-world handles a transition may act on
pub struct Effects<'a> {
    pub drawing: DrawingId,
    pub feeds: &'a mut dyn EventFeeds,
    pub host: &'a mut dyn ChartHost,
    pub context: &'a SharedContext,
}

/// Result of feeding a pointer position to an idle or hovering drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverChange {
    Entered,
    Left,
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interaction {
    state: InteractionState,
    /// Chart position of the previous drag frame
    last_drag_point: Option<Point>,
}

impl Interaction {
    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn hovered(&self) -> bool {
        self.state != InteractionState::Idle
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    /// Enter `next`, performing its cursor, feed and scroll side effects
    pub fn move_to(&mut self, next: InteractionState, fx: &mut Effects<'_>) {
        let was_dragging = self.state.is_dragging();
        debug!("Drawing {}: {} -> {}", fx.drawing, self.state.name(), next.name());

        match next {
            InteractionState::Idle => {
                // The cursor is shared; an idle drawing does not own it
                if self.state != InteractionState::Idle {
                    fx.context.set_cursor(CursorStyle::Default);
                }
                fx.feeds.unsubscribe(Feed::MouseDown, fx.drawing);
                fx.feeds.unsubscribe(Feed::MouseUp, fx.drawing);
                if was_dragging {
                    fx.host.set_scroll_enabled(true);
                }
            }
            InteractionState::Hovering => {
                fx.context.set_cursor(CursorStyle::Pointer);
                fx.feeds.unsubscribe(Feed::MouseUp, fx.drawing);
                fx.feeds.subscribe(Feed::MouseDown, fx.drawing);
                if was_dragging {
                    fx.host.set_scroll_enabled(true);
                }
            }
            InteractionState::Dragging | InteractionState::DraggingHandle(_) => {
                fx.context.set_cursor(CursorStyle::Grabbing);
                fx.feeds.subscribe(Feed::MouseUp, fx.drawing);
                fx.host.set_scroll_enabled(false);
                self.last_drag_point = None;
            }
        }

        if !next.is_dragging() {
            self.last_drag_point = None;
        }
        self.state = next;
    }

    /// Track whether the pointer is over the shape. Ignored mid-drag.
    pub fn on_hover(&mut self, over: bool, fx: &mut Effects<'_>) -> HoverChange {
        match (self.state, over) {
            (InteractionState::Idle, true) => {
                self.move_to(InteractionState::Hovering, fx);
                HoverChange::Entered
            }
            (InteractionState::Hovering, false) => {
                self.move_to(InteractionState::Idle, fx);
                HoverChange::Left
            }
            _ => HoverChange::Unchanged,
        }
    }

    /// Start a drag from the hovering state.
    ///
    /// `corners` are the two projected points of a two-point drawing; `None`
    /// for single-point drawings or when either point is unresolved, in which
    /// case the whole shape is dragged.
    pub fn on_pointer_down(
        &mut self,
        pos: Pos2,
        corners: Option<(Pos2, Pos2)>,
        tolerance: f32,
        fx: &mut Effects<'_>,
    ) -> InteractionState {
        if self.state != InteractionState::Hovering {
            return self.state;
        }
        let next = corners
            .and_then(|(p1, p2)| pick_handle(pos, p1, p2, tolerance))
            .map_or(InteractionState::Dragging, InteractionState::DraggingHandle);
        self.move_to(next, fx);
        next
    }

    /// End a drag wherever the pointer is. Returns whether a drag ended.
    pub fn on_pointer_up(&mut self, fx: &mut Effects<'_>) -> bool {
        if !self.state.is_dragging() {
            return false;
        }
        self.move_to(InteractionState::Idle, fx);
        true
    }

    /// Movement since the previous drag frame, `None` when not dragging
    pub fn drag_to(&mut self, point: Point) -> Option<DragDelta> {
        if !self.state.is_dragging() {
            return None;
        }
        let start = self.last_drag_point.unwrap_or(point);
        self.last_drag_point = Some(point);
        Some(DragDelta::between(&start, &point))
    }

    /// Return to idle from any state (deletion, tool switch, clear)
    pub fn deactivate(&mut self, fx: &mut Effects<'_>) {
        self.move_to(InteractionState::Idle, fx);
    }
}

/// Apply one frame of drag movement to the points the state targets.
/// Returns whether any point moved.
pub fn apply_drag(state: InteractionState, points: &mut [Point], delta: DragDelta) -> bool {
    if delta.is_zero() {
        return false;
    }
    match (state, points) {
        (InteractionState::Dragging, points) => {
            for point in points.iter_mut() {
                point.offset(delta.logical, delta.price);
            }
            !points.is_empty()
        }
        (InteractionState::DraggingHandle(handle), [p1, p2, ..]) => {
            match handle {
                Handle::One => p1.offset(delta.logical, delta.price),
                Handle::Two => p2.offset(delta.logical, delta.price),
                Handle::Three => {
                    p1.offset(delta.logical, 0.0);
                    p2.offset(0, delta.price);
                }
                Handle::Four => {
                    p1.offset(0, delta.price);
                    p2.offset(delta.logical, 0.0);
                }
            }
            true
        }
        _ => false,
    }
}
