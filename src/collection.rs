//! Owner of one chart pane's live drawings.
//!
//! Routes pointer input to the drawings' state machines, runs interactive
//! creation sessions, and queues lifecycle notifications for the toolbox to
//! flush.

use egui::Pos2;
use log::{debug, info};
use serde_json::Value;

use crate::config::{AxisMode, ToolboxConfig};
use crate::drawing::{Drawing, DrawingId, DrawingKind, LifecycleEvent, LifecycleKind};
use crate::error::DrawingError;
use crate::host::{ChartHost, SharedContext};
use crate::interaction::{Effects, Feed, Subscriptions};
use crate::point::Point;

/// Result of a click while a creation session may be running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No session, or the click was outside the projectable window
    Ignored,
    /// First point of a two-point drawing placed
    Started(DrawingId),
    /// Final point placed; the drawing joined the collection
    Committed(DrawingId),
}

#[derive(Debug)]
struct CreationSession {
    kind: DrawingKind,
    /// Uncommitted drawing once the first point is placed
    pending: Option<Drawing>,
}

#[derive(Debug, Default)]
pub struct DrawingCollection {
    drawings: Vec<Drawing>,
    subscriptions: Subscriptions,
    creation: Option<CreationSession>,
    hovered: Option<DrawingId>,
    last_hovered: Option<DrawingId>,
    dragging: Option<DrawingId>,
    axis_mode: AxisMode,
    stale: bool,
    outbox: Vec<LifecycleEvent>,
}

macro_rules! effects {
    ($self:ident, $id:expr, $host:expr, $context:expr) => {
        Effects {
            drawing: $id,
            feeds: &mut $self.subscriptions,
            host: $host,
            context: $context,
        }
    };
}

impl DrawingCollection {
    pub fn new(axis_mode: AxisMode) -> Self {
        Self {
            axis_mode,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    /// Committed drawings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Drawing> {
        self.drawings.iter()
    }

    pub fn get(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id() == id)
    }

    pub fn last(&self) -> Option<&Drawing> {
        self.drawings.last()
    }

    pub fn hovered(&self) -> Option<DrawingId> {
        self.hovered
    }

    pub fn last_hovered(&self) -> Option<DrawingId> {
        self.last_hovered
    }

    /// The drawing under the pointer, else the one most recently under it
    pub fn hovered_or_last(&self) -> Option<DrawingId> {
        self.hovered
            .or(self.last_hovered)
            .filter(|id| self.get(*id).is_some())
    }

    pub fn dragging(&self) -> Option<DrawingId> {
        self.dragging
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Variant of the running creation session
    pub fn creating(&self) -> Option<DrawingKind> {
        self.creation.as_ref().map(|session| session.kind)
    }

    pub fn pending(&self) -> Option<&Drawing> {
        self.creation.as_ref().and_then(|s| s.pending.as_ref())
    }

    pub fn axis_mode(&self) -> AxisMode {
        self.axis_mode
    }

    pub fn set_axis_mode(&mut self, mode: AxisMode) {
        self.axis_mode = mode;
        self.stale = true;
    }

    /// Mark every projection stale, e.g. after the visible range changed
    pub fn request_redraw(&mut self) {
        self.stale = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.stale
    }

    /// Re-project all drawings if a redraw was requested since the last pass.
    /// Returns whether anything was re-projected.
    pub fn ensure_projected(&mut self, host: &dyn ChartHost) -> bool {
        if !self.stale {
            return false;
        }
        let mode = self.axis_mode;
        for drawing in &mut self.drawings {
            drawing.update_view(host, mode);
        }
        if let Some(pending) = self.creation.as_mut().and_then(|s| s.pending.as_mut()) {
            pending.update_view(host, mode);
        }
        self.stale = false;
        true
    }

    /// Lifecycle notifications queued since the last call
    pub fn take_lifecycle(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn notify(&mut self, drawing: &Drawing, kind: LifecycleKind) {
        if let Some(event) = drawing.lifecycle(kind) {
            self.outbox.push(event);
        }
    }

    /// Insert a fully constructed drawing (loaded or programmatic)
    pub fn add(&mut self, drawing: Drawing) -> DrawingId {
        let id = drawing.id();
        debug!("Adding {} drawing {}", drawing.kind(), id);
        self.notify(&drawing, LifecycleKind::Created);
        self.drawings.push(drawing);
        self.stale = true;
        id
    }

    pub fn update_points(
        &mut self,
        id: DrawingId,
        updates: &[Option<Point>],
    ) -> Result<bool, DrawingError> {
        let drawing = self
            .drawings
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or(DrawingError::UnknownDrawing(id))?;
        let changed = drawing.update_points(updates);
        if changed {
            let event = drawing.lifecycle(LifecycleKind::Updated);
            self.outbox.extend(event);
            self.stale = true;
        }
        Ok(changed)
    }

    pub fn apply_options(&mut self, id: DrawingId, patch: &Value) -> Result<(), DrawingError> {
        let drawing = self
            .drawings
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or(DrawingError::UnknownDrawing(id))?;
        drawing.apply_options(patch);
        self.stale = true;
        Ok(())
    }

    /// Detach a drawing: back to idle, all feeds dropped, `deleted` announced
    pub fn remove(
        &mut self,
        id: DrawingId,
        host: &mut dyn ChartHost,
        context: &SharedContext,
    ) -> Option<Drawing> {
        let index = self.drawings.iter().position(|d| d.id() == id)?;
        let mut drawing = self.drawings.remove(index);
        {
            let mut fx = effects!(self, id, host, context);
            drawing.interaction_mut().deactivate(&mut fx);
        }
        self.subscriptions.remove_drawing(id);
        for slot in [&mut self.hovered, &mut self.last_hovered, &mut self.dragging] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.notify(&drawing, LifecycleKind::Deleted);
        self.stale = true;
        info!("Removed {} drawing {}", drawing.kind(), id);
        Some(drawing)
    }

    /// Remove the most recently added drawing
    pub fn pop_last(
        &mut self,
        host: &mut dyn ChartHost,
        context: &SharedContext,
    ) -> Option<Drawing> {
        let id = self.drawings.last()?.id();
        self.remove(id, host, context)
    }

    /// Detach every drawing and drop any running creation session
    pub fn clear(&mut self, host: &mut dyn ChartHost, context: &SharedContext) -> usize {
        self.cancel_creation();
        let ids: Vec<_> = self.drawings.iter().map(Drawing::id).collect();
        for id in &ids {
            self.remove(*id, host, context);
        }
        self.subscriptions.clear();
        self.hovered = None;
        self.last_hovered = None;
        ids.len()
    }

    fn deactivate_all(&mut self, host: &mut dyn ChartHost, context: &SharedContext) {
        for drawing in &mut self.drawings {
            if !drawing.hovered() {
                continue;
            }
            let mut fx = effects!(self, drawing.id(), &mut *host, context);
            drawing.interaction_mut().deactivate(&mut fx);
        }
        self.hovered = None;
        self.dragging = None;
    }

    /// Start an interactive creation session, replacing any running one
    pub fn begin_creation(
        &mut self,
        kind: DrawingKind,
        host: &mut dyn ChartHost,
        context: &SharedContext,
    ) {
        self.cancel_creation();
        self.deactivate_all(host, context);
        debug!("Creating {kind}");
        self.creation = Some(CreationSession {
            kind,
            pending: None,
        });
    }

    /// Drop the running session and its uncommitted drawing.
    /// Returns whether a session was running.
    pub fn cancel_creation(&mut self) -> bool {
        let Some(session) = self.creation.take() else {
            return false;
        };
        if let Some(pending) = session.pending {
            self.notify(&pending, LifecycleKind::Deleted);
            self.stale = true;
        }
        debug!("Cancelled {} creation", session.kind);
        true
    }

    /// Place the next point of the running creation session
    pub fn on_click(
        &mut self,
        pos: Pos2,
        host: &dyn ChartHost,
        config: &ToolboxConfig,
    ) -> ClickOutcome {
        let Some(session) = self.creation.as_mut() else {
            return ClickOutcome::Ignored;
        };
        let Some(point) = host.point_at(pos) else {
            return ClickOutcome::Ignored;
        };
        let kind = session.kind;

        let mut drawing = match session.pending.take() {
            Some(mut pending) => {
                if pending.update_points(&[None, Some(point)]) {
                    let event = pending.lifecycle(LifecycleKind::Updated);
                    self.outbox.extend(event);
                }
                pending
            }
            None => {
                let points = vec![point; kind.point_count()];
                let mut drawing = match Drawing::with_defaults(kind, points, config) {
                    Ok(drawing) => drawing,
                    Err(_) => return ClickOutcome::Ignored,
                };
                if let (DrawingKind::Measure, Some(callback)) = (kind, &config.measure_callback) {
                    drawing = drawing.with_callback(callback.clone());
                }
                self.notify(&drawing, LifecycleKind::Created);

                if kind.is_two_point() {
                    let id = drawing.id();
                    drawing.update_view(host, self.axis_mode);
                    if let Some(session) = self.creation.as_mut() {
                        session.pending = Some(drawing);
                    }
                    return ClickOutcome::Started(id);
                }
                drawing
            }
        };

        self.creation = None;
        drawing.update_view(host, self.axis_mode);
        let id = drawing.id();
        info!("Committed {kind} drawing {id}");
        self.drawings.push(drawing);
        self.stale = true;
        ClickOutcome::Committed(id)
    }

    /// Feed a pointer move: preview a pending drawing, advance the active
    /// drag, or route hover. Returns whether a redraw is needed.
    pub fn on_pointer_move(
        &mut self,
        pos: Pos2,
        host: &mut dyn ChartHost,
        context: &SharedContext,
        tolerance: f32,
    ) -> bool {
        self.ensure_projected(&*host);

        if let Some(session) = self.creation.as_mut() {
            let (Some(pending), Some(point)) = (session.pending.as_mut(), host.point_at(pos))
            else {
                return false;
            };
            if !pending.update_points(&[None, Some(point)]) {
                return false;
            }
            let event = pending.lifecycle(LifecycleKind::Updated);
            self.outbox.extend(event);
            self.stale = true;
            return true;
        }

        if let Some(id) = self.dragging {
            let Some(point) = host.point_at(pos) else {
                return false;
            };
            let Some(drawing) = self.drawings.iter_mut().find(|d| d.id() == id) else {
                self.dragging = None;
                return false;
            };
            let delta = drawing.interaction_mut().drag_to(point);
            let moved = delta.is_some_and(|delta| drawing.apply_drag(delta, &*host));
            self.stale |= moved;
            return moved;
        }

        self.route_hover(Some(pos), host, context, tolerance);
        false
    }

    /// Pointer left the pane; hovering drawings fall back to idle
    pub fn on_pointer_leave(&mut self, host: &mut dyn ChartHost, context: &SharedContext) {
        if self.dragging.is_none() && self.creation.is_none() {
            self.route_hover(None, host, context, 0.0);
        }
    }

    fn route_hover(
        &mut self,
        pos: Option<Pos2>,
        host: &mut dyn ChartHost,
        context: &SharedContext,
        tolerance: f32,
    ) {
        // Topmost (latest) drawing wins when shapes overlap
        let target = pos.and_then(|pos| {
            self.drawings
                .iter()
                .rev()
                .find(|d| d.kind().is_interactive() && d.hit_test(pos, tolerance))
                .map(Drawing::id)
        });

        // Leaves before the enter so the cursor ends up on the new target
        for drawing in &mut self.drawings {
            if Some(drawing.id()) != target {
                let mut fx = effects!(self, drawing.id(), &mut *host, context);
                drawing.interaction_mut().on_hover(false, &mut fx);
            }
        }
        if let Some(id) = target {
            if let Some(drawing) = self.drawings.iter_mut().find(|d| d.id() == id) {
                let mut fx = effects!(self, id, &mut *host, context);
                drawing.interaction_mut().on_hover(true, &mut fx);
            }
            self.last_hovered = Some(id);
        }
        if self.hovered != target {
            debug!("Hover {:?} -> {:?}", self.hovered, target);
            self.hovered = target;
            self.stale = true;
        }
    }

    /// Deliver a pointer-down to the drawing listening for it.
    /// Returns whether a drag started.
    pub fn on_pointer_down(
        &mut self,
        pos: Pos2,
        host: &mut dyn ChartHost,
        context: &SharedContext,
        tolerance: f32,
    ) -> bool {
        if self.creation.is_some() || self.dragging.is_some() {
            return false;
        }
        self.ensure_projected(&*host);

        let Some(index) = self
            .drawings
            .iter()
            .rposition(|d| self.subscriptions.is_subscribed(Feed::MouseDown, d.id()))
        else {
            return false;
        };
        let start = host.point_at(pos);
        let drawing = &mut self.drawings[index];
        let id = drawing.id();
        let corners = drawing.handle_corners();
        let state = {
            let mut fx = effects!(self, id, &mut *host, context);
            drawing
                .interaction_mut()
                .on_pointer_down(pos, corners, tolerance, &mut fx)
        };
        if !state.is_dragging() {
            return false;
        }
        if let Some(start) = start {
            drawing.interaction_mut().drag_to(start);
        }
        debug!("Drawing {id} captured the pointer ({})", state.name());
        self.dragging = Some(id);
        true
    }

    /// Deliver a pointer-up to the dragging drawing.
    /// Returns the drawing whose drag ended.
    pub fn on_pointer_up(
        &mut self,
        host: &mut dyn ChartHost,
        context: &SharedContext,
    ) -> Option<DrawingId> {
        let id = self.dragging?;
        if !self.subscriptions.is_subscribed(Feed::MouseUp, id) {
            return None;
        }
        let index = self.drawings.iter().position(|d| d.id() == id)?;
        let drawing = &mut self.drawings[index];
        let ended = {
            let mut fx = effects!(self, id, host, context);
            drawing.interaction_mut().on_pointer_up(&mut fx)
        };
        if !ended {
            return None;
        }
        let event = drawing.lifecycle(LifecycleKind::Updated);
        self.outbox.extend(event);
        self.dragging = None;
        self.hovered = None;
        self.stale = true;
        Some(id)
    }
}
