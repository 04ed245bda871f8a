use egui::{Key, Pos2};
use log::{debug, info, warn};
use serde_json::{Value, json};

use super::hotkeys::{Chord, HotkeyBinding, HotkeyRegistry, ToolboxCommand};
use super::{ToolEntry, default_tools};
use crate::collection::{ClickOutcome, DrawingCollection};
use crate::config::ToolboxConfig;
use crate::drawing::{Drawing, DrawingId, DrawingKind, LengthDisplay};
use crate::error::{DrawingError, PersistenceResult, ToolboxResult};
use crate::host::{ChartHost, CursorStyle, InstanceId, SharedContext};
use crate::persistence::{
    self, ControllerSink, LoadReport, drawings_from_values, lifecycle_message, save_message,
};
use crate::point::Point;
use crate::renderer::{Canvas, PaintInput, Renderer};

/// Drawing tools of one chart pane.
///
/// Owns the pane's [`DrawingCollection`], maps tool selection and hotkeys to
/// creation sessions, and pushes bulk saves and lifecycle events into its
/// [`ControllerSink`].
pub struct Toolbox {
    instance: InstanceId,
    entries: Vec<ToolEntry>,
    active: Option<usize>,
    collection: DrawingCollection,
    context: SharedContext,
    sink: Box<dyn ControllerSink>,
    config: ToolboxConfig,
    renderer: Renderer,
}

impl Toolbox {
    pub fn new(
        instance: InstanceId,
        context: SharedContext,
        sink: impl ControllerSink + 'static,
        config: ToolboxConfig,
    ) -> Self {
        Self {
            instance,
            entries: default_tools(),
            active: None,
            collection: DrawingCollection::new(config.axis_mode),
            context,
            sink: Box::new(sink),
            renderer: Renderer::new(config.handle_radius),
            config,
        }
    }

    pub fn with_entries(mut self, entries: Vec<ToolEntry>) -> Self {
        self.entries = entries;
        self.active = None;
        self
    }

    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }

    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_tool(&self) -> Option<&ToolEntry> {
        self.active.and_then(|i| self.entries.get(i))
    }

    pub fn collection(&self) -> &DrawingCollection {
        &self.collection
    }

    pub fn config(&self) -> &ToolboxConfig {
        &self.config
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// Take the shared focus token so hotkeys route here
    pub fn focus(&self) {
        self.context.focus(&self.instance);
    }

    pub fn has_focus(&self) -> bool {
        self.context.is_focused(&self.instance)
    }

    /// Whether pointer input currently belongs to the drawings rather than
    /// the chart (creation session or drag in progress)
    pub fn is_capturing(&self) -> bool {
        self.collection.creating().is_some() || self.collection.dragging().is_some()
    }

    /// Append this toolbox's hotkey predicates
    pub fn register_hotkeys(&self, registry: &mut HotkeyRegistry) {
        let mut bind = |chord, command| {
            registry.push(HotkeyBinding {
                instance: self.instance.clone(),
                chord,
                command,
            });
        };
        for (index, entry) in self.entries.iter().enumerate() {
            bind(Chord::Alt(entry.hotkey), ToolboxCommand::SelectTool(index));
        }
        bind(Chord::Command(Key::Z), ToolboxCommand::UndoLast);
        if self.config.enable_delete_hotkey {
            bind(Chord::Plain(Key::Delete), ToolboxCommand::DeleteHovered);
        }
    }

    /// Run a command matched by the hotkey registry.
    /// Returns whether it had any effect.
    pub fn execute(
        &mut self,
        command: ToolboxCommand,
        host: &mut dyn ChartHost,
    ) -> PersistenceResult<bool> {
        match command {
            ToolboxCommand::SelectTool(index) => self.on_icon_activate(index, host).map(|_| true),
            ToolboxCommand::UndoLast => self.undo_last(host),
            ToolboxCommand::DeleteHovered => self.delete_hovered(host),
        }
    }

    /// Toggle the tool at `index`. Any running session is cancelled first;
    /// activating the already active tool leaves no tool active.
    /// Returns whether a tool is active afterwards.
    pub fn on_icon_activate(
        &mut self,
        index: usize,
        host: &mut dyn ChartHost,
    ) -> PersistenceResult<bool> {
        let Some(entry) = self.entries.get(index).copied() else {
            warn!("No tool at index {index}");
            return Ok(self.active.is_some());
        };

        let previous = self.active;
        if previous.is_some() {
            self.remove_active_and_save()?;
        }
        if previous == Some(index) {
            debug!("Deselected {}", entry.label);
            return Ok(false);
        }

        self.active = Some(index);
        self.collection.begin_creation(entry.kind, host, &self.context);
        self.context.set_cursor(CursorStyle::Crosshair);
        self.flush();
        debug!("Selected {} on {}", entry.label, self.instance);
        Ok(true)
    }

    /// End the running session, clear the active tool and persist
    pub fn remove_active_and_save(&mut self) -> PersistenceResult<()> {
        self.active = None;
        self.collection.cancel_creation();
        self.context.set_cursor(CursorStyle::Default);
        self.flush();
        self.save_drawings()
    }

    /// Send the whole drawing set as one bulk save
    pub fn save_drawings(&mut self) -> PersistenceResult<()> {
        let records = persistence::records(self.collection.iter());
        let message = save_message(&self.instance, &records)?;
        self.sink.send(message);
        info!("Saved {} drawings of {}", records.len(), self.instance);
        Ok(())
    }

    /// Add the drawings of a JSON record list. Entries that cannot be rebuilt
    /// are skipped and listed in the report.
    pub fn load_drawings(&mut self, payload: &str) -> PersistenceResult<LoadReport> {
        let entries: Vec<Value> = serde_json::from_str(payload)?;
        Ok(self.load_values(entries))
    }

    pub fn load_values(&mut self, entries: Vec<Value>) -> LoadReport {
        let (drawings, report) = drawings_from_values(entries, &self.config);
        for drawing in drawings {
            self.collection.add(drawing);
        }
        self.flush();
        info!("Loaded drawings into {}: {report}", self.instance);
        report
    }

    pub fn add_new_drawing(&mut self, drawing: Drawing) -> DrawingId {
        let id = self.collection.add(drawing);
        self.flush();
        id
    }

    pub fn update_points(
        &mut self,
        id: DrawingId,
        updates: &[Option<Point>],
    ) -> Result<bool, DrawingError> {
        let changed = self.collection.update_points(id, updates)?;
        self.flush();
        Ok(changed)
    }

    /// Lay `patch` over the drawing's options and persist
    pub fn apply_options(&mut self, id: DrawingId, patch: &Value) -> ToolboxResult<()> {
        self.collection.apply_options(id, patch)?;
        self.save_drawings()?;
        Ok(())
    }

    /// Delete one drawing, e.g. from a context menu, and persist
    pub fn delete_drawing(
        &mut self,
        id: DrawingId,
        host: &mut dyn ChartHost,
    ) -> ToolboxResult<Drawing> {
        let drawing = self
            .collection
            .remove(id, host, &self.context)
            .ok_or(DrawingError::UnknownDrawing(id))?;
        self.after_delete()?;
        Ok(drawing)
    }

    /// Delete the most recently added drawing and persist.
    /// Returns whether one was deleted.
    pub fn undo_last(&mut self, host: &mut dyn ChartHost) -> PersistenceResult<bool> {
        if self.collection.pop_last(host, &self.context).is_none() {
            return Ok(false);
        }
        self.after_delete()?;
        Ok(true)
    }

    /// Delete the hovered drawing, else the last hovered one, and persist
    pub fn delete_hovered(&mut self, host: &mut dyn ChartHost) -> PersistenceResult<bool> {
        let Some(id) = self.collection.hovered_or_last() else {
            return Ok(false);
        };
        if self.collection.remove(id, host, &self.context).is_none() {
            return Ok(false);
        }
        self.after_delete()?;
        Ok(true)
    }

    fn after_delete(&mut self) -> PersistenceResult<()> {
        if self.active.is_some() {
            self.context.set_cursor(CursorStyle::Crosshair);
        }
        self.flush();
        self.save_drawings()
    }

    /// Detach every drawing without a bulk save.
    /// Returns the number of drawings removed.
    pub fn clear_drawings(&mut self, host: &mut dyn ChartHost) -> usize {
        self.active = None;
        let count = self.collection.clear(host, &self.context);
        self.context.set_cursor(CursorStyle::Default);
        self.flush();
        debug!("Cleared {count} drawings from {}", self.instance);
        count
    }

    /// Lifecycle channel for measurements created from now on
    pub fn set_measure_callback(&mut self, callback: Option<String>) {
        self.config.measure_callback = callback;
    }

    /// Length label mode for new and existing measurements. Persists when
    /// an existing measurement changed.
    pub fn set_measure_length_display(&mut self, display: LengthDisplay) {
        self.config.measure_length_display = display;
        let patch = json!({ "lengthDisplay": display });
        let measures: Vec<_> = self
            .collection
            .iter()
            .filter(|d| d.kind() == DrawingKind::Measure)
            .map(Drawing::id)
            .collect();
        if measures.is_empty() {
            return;
        }
        for id in measures {
            if let Err(err) = self.collection.apply_options(id, &patch) {
                warn!("Failed to update measurement {id}: {err}");
            }
        }
        if let Err(err) = self.save_drawings() {
            warn!("Failed to save drawings of {}: {err}", self.instance);
        }
    }

    /// Place a creation point, or hand the press to the hovered drawing.
    /// Returns whether the press was consumed.
    pub fn on_pointer_down(
        &mut self,
        pos: Pos2,
        host: &mut dyn ChartHost,
    ) -> PersistenceResult<bool> {
        self.focus();
        if self.collection.creating().is_some() {
            match self.collection.on_click(pos, &*host, &self.config) {
                ClickOutcome::Committed(_) => self.remove_active_and_save()?,
                ClickOutcome::Started(_) | ClickOutcome::Ignored => self.flush(),
            }
            return Ok(true);
        }
        let captured =
            self.collection
                .on_pointer_down(pos, host, &self.context, self.config.tolerance);
        Ok(captured)
    }

    /// Returns whether a redraw is needed
    pub fn on_pointer_move(&mut self, pos: Pos2, host: &mut dyn ChartHost) -> bool {
        let changed =
            self.collection
                .on_pointer_move(pos, host, &self.context, self.config.tolerance);
        self.flush();
        changed || self.collection.needs_redraw()
    }

    /// End a drag and persist the moved drawing.
    /// Returns whether a drag ended.
    pub fn on_pointer_up(&mut self, host: &mut dyn ChartHost) -> PersistenceResult<bool> {
        if self.collection.on_pointer_up(host, &self.context).is_none() {
            return Ok(false);
        }
        self.flush();
        self.save_drawings()?;
        Ok(true)
    }

    pub fn on_pointer_leave(&mut self, host: &mut dyn ChartHost) {
        self.collection.on_pointer_leave(host, &self.context);
    }

    /// The chart scrolled or zoomed; projections are stale
    pub fn on_visible_range_changed(&mut self) {
        self.collection.request_redraw();
    }

    /// Project if needed, then paint every drawing and the pending one.
    /// Returns how many drawings were painted.
    pub fn paint(&mut self, canvas: &mut dyn Canvas, host: &dyn ChartHost) -> usize {
        self.collection.ensure_projected(host);
        let pending = self.collection.pending();
        self.collection
            .iter()
            .chain(pending)
            .filter(|drawing| self.renderer.paint(canvas, &PaintInput::from(*drawing)))
            .count()
    }

    fn flush(&mut self) {
        for event in self.collection.take_lifecycle() {
            match lifecycle_message(&event) {
                Ok(message) => self.sink.send(message),
                Err(err) => warn!("Dropping {} event of {}: {err}", event.kind.as_str(), event.callback),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LinearScale;
    use crate::persistence::MessageLog;
    use crate::tools::KeyEvent;
    use egui::{Modifiers, Rect, pos2};

    // x = 10 * logical, y = 500 - price, one bar per minute
    fn host() -> LinearScale {
        LinearScale::new(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1000.0, 500.0)),
            0.0,
            10.0,
            (0.0, 500.0),
        )
        .with_series(0, 60, 200)
    }

    fn toolbox(config: ToolboxConfig) -> (Toolbox, MessageLog) {
        let log = MessageLog::new();
        let toolbox = Toolbox::new(InstanceId::new("w"), SharedContext::new(), log.clone(), config);
        (toolbox, log)
    }

    fn index_of(toolbox: &Toolbox, kind: DrawingKind) -> usize {
        toolbox.entries().iter().position(|e| e.kind == kind).unwrap()
    }

    #[test]
    fn test_icon_toggle() {
        let mut host = host();
        let (mut toolbox, log) = toolbox(ToolboxConfig::default());
        let trend = index_of(&toolbox, DrawingKind::TrendLine);
        let ray = index_of(&toolbox, DrawingKind::RayLine);

        assert!(toolbox.on_icon_activate(trend, &mut host).unwrap());
        assert_eq!(toolbox.context().cursor(), CursorStyle::Crosshair);
        assert_eq!(toolbox.collection().creating(), Some(DrawingKind::TrendLine));

        assert!(toolbox.on_icon_activate(ray, &mut host).unwrap());
        assert_eq!(toolbox.active_index(), Some(ray));
        assert_eq!(toolbox.collection().creating(), Some(DrawingKind::RayLine));

        assert!(!toolbox.on_icon_activate(ray, &mut host).unwrap());
        assert_eq!(toolbox.active_tool(), None);
        assert_eq!(toolbox.collection().creating(), None);
        assert_eq!(toolbox.context().cursor(), CursorStyle::Default);
        assert_eq!(log.last().unwrap(), "save_drawingsw_~_[]");
    }

    #[test]
    fn test_single_point_creation_commits_and_saves() {
        let mut host = host();
        let (mut toolbox, log) = toolbox(ToolboxConfig::default());
        let horizontal = index_of(&toolbox, DrawingKind::HorizontalLine);

        toolbox.on_icon_activate(horizontal, &mut host).unwrap();
        assert!(toolbox.on_pointer_down(pos2(100.0, 100.0), &mut host).unwrap());

        assert_eq!(toolbox.active_index(), None);
        assert!(toolbox.has_focus());
        assert_eq!(toolbox.collection().len(), 1);
        let saved = log.last().unwrap();
        assert!(saved.starts_with(
            r#"save_drawingsw_~_[{"type":"HorizontalLine","points":[{"time":600,"logical":10,"price":400.0}]"#
        ));
    }

    #[test]
    fn test_measure_lifecycle_messages() {
        let mut host = host();
        let (mut toolbox, log) = toolbox(ToolboxConfig::default());
        toolbox.set_measure_callback(Some("m1".into()));
        let measure = index_of(&toolbox, DrawingKind::Measure);

        toolbox.on_icon_activate(measure, &mut host).unwrap();
        log.drain();
        toolbox.on_pointer_down(pos2(100.0, 100.0), &mut host).unwrap();
        toolbox.on_pointer_move(pos2(200.0, 150.0), &mut host);
        toolbox.on_pointer_down(pos2(200.0, 150.0), &mut host).unwrap();

        let messages = log.drain();
        assert_eq!(
            messages[0],
            r#"m1_~_created_~_[{"time":600,"logical":10,"price":400.0},{"time":600,"logical":10,"price":400.0}]"#
        );
        assert_eq!(
            messages[1],
            r#"m1_~_updated_~_[{"time":600,"logical":10,"price":400.0},{"time":1200,"logical":20,"price":350.0}]"#
        );
        assert!(messages[2].starts_with(r#"save_drawingsw_~_[{"type":"Measure""#));
        assert_eq!(messages.len(), 3);

        assert!(toolbox.undo_last(&mut host).unwrap());
        let messages = log.drain();
        assert!(messages[0].starts_with("m1_~_deleted_~_"));
        assert_eq!(messages[1], "save_drawingsw_~_[]");
    }

    #[test]
    fn test_hotkeys_follow_focus_and_config() {
        let mut host = host();
        let (mut toolbox, _log) = toolbox(ToolboxConfig {
            enable_delete_hotkey: false,
            ..Default::default()
        });
        let mut registry = HotkeyRegistry::new(toolbox.context().clone());
        toolbox.register_hotkeys(&mut registry);
        assert!(
            registry
                .bindings()
                .iter()
                .all(|b| b.command != ToolboxCommand::DeleteHovered)
        );

        let mut event = KeyEvent::new(Key::B, Modifiers::ALT);
        assert_eq!(registry.dispatch(&mut event), None);

        toolbox.focus();
        let hit = registry.dispatch(&mut event).unwrap();
        assert!(toolbox.execute(hit.command, &mut host).unwrap());
        assert_eq!(toolbox.collection().creating(), Some(DrawingKind::Box));
    }

    #[test]
    fn test_clear_does_not_save() {
        let mut host = host();
        let (mut toolbox, log) = toolbox(ToolboxConfig::default());
        let report = toolbox
            .load_drawings(
                r#"[{"type":"Box","points":[{"logical":1,"price":1},{"logical":2,"price":2}],"options":{}}]"#,
            )
            .unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(toolbox.clear_drawings(&mut host), 1);
        assert!(toolbox.collection().is_empty());
        assert!(log.messages().is_empty());
    }

    #[test]
    fn test_length_display_updates_existing_measures() {
        let (mut toolbox, log) = toolbox(ToolboxConfig::default());
        let drawing = Drawing::with_defaults(
            DrawingKind::Measure,
            vec![Point::at(1, 1.0), Point::at(2, 2.0)],
            toolbox.config(),
        )
        .unwrap();
        let id = toolbox.add_new_drawing(drawing);
        assert!(log.messages().is_empty());
        toolbox.set_measure_length_display(LengthDisplay::Bars);

        let options = toolbox.collection().get(id).unwrap().options();
        assert_eq!(options.as_measure().unwrap().length_display, LengthDisplay::Bars);
        assert_eq!(toolbox.config().measure_length_display, LengthDisplay::Bars);
        let saved = log.last().unwrap();
        assert!(saved.starts_with(r#"save_drawingsw_~_[{"type":"Measure""#));
        assert!(saved.contains(r#""lengthDisplay":"bars""#));
    }

    #[test]
    fn test_undo_keeps_crosshair_while_tool_active() {
        let mut host = host();
        let (mut toolbox, _log) = toolbox(ToolboxConfig::default());
        toolbox
            .load_drawings(
                r#"[{"type":"Box","points":[{"logical":1,"price":1},{"logical":2,"price":2}],"options":{}}]"#,
            )
            .unwrap();
        let trend = index_of(&toolbox, DrawingKind::TrendLine);
        toolbox.on_icon_activate(trend, &mut host).unwrap();

        assert!(toolbox.undo_last(&mut host).unwrap());
        assert_eq!(toolbox.active_index(), Some(trend));
        assert_eq!(toolbox.context().cursor(), CursorStyle::Crosshair);
    }
}
