use chart_drawings::renderer::Canvas;
use chart_drawings::tools::{Chord, ToolboxCommand};
use chart_drawings::{
    CursorStyle, DrawingKind, HotkeyRegistry, InstanceId, KeyEvent, LinearScale, MessageLog,
    SharedContext, Toolbox, ToolboxConfig,
};
use chart_drawings::drawing::LineStyle;
use egui::{Color32, Key, Modifiers, Pos2, Rect, Stroke, pos2};

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

fn toolbox(name: &str, context: &SharedContext) -> (Toolbox, MessageLog) {
    let log = MessageLog::new();
    let toolbox = Toolbox::new(
        InstanceId::new(name),
        context.clone(),
        log.clone(),
        ToolboxConfig::default(),
    );
    (toolbox, log)
}

const BOX: &str = r#"[{"type":"Box","points":[{"logical":10,"price":400.0},{"logical":20,"price":300.0}],"options":{}}]"#;

#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
}

impl Canvas for Recorder {
    fn bounds(&self) -> Rect {
        Rect::from_min_max(pos2(0.0, 0.0), pos2(1000.0, 500.0))
    }

    fn line(&mut self, from: Pos2, to: Pos2, _stroke: Stroke, _style: LineStyle) {
        self.calls.push(format!("line {from:?} {to:?}"));
    }

    fn fill_rect(&mut self, rect: Rect, _color: Color32) {
        self.calls.push(format!("fill {rect:?}"));
    }

    fn circle(&mut self, center: Pos2, _radius: f32, _fill: Color32, _stroke: Stroke) {
        self.calls.push(format!("circle {center:?}"));
    }

    fn text(&mut self, pos: Pos2, text: &str, _color: Color32) {
        self.calls.push(format!("text {pos:?} {text}"));
    }
}

#[test]
fn test_hotkeys_route_to_focused_instance() {
    let mut host = host();
    let context = SharedContext::new();
    let (mut left, _) = toolbox("window.left", &context);
    let (mut right, _) = toolbox("window.right", &context);

    let mut registry = HotkeyRegistry::new(context.clone());
    left.register_hotkeys(&mut registry);
    right.register_hotkeys(&mut registry);
    assert!(registry.bindings().iter().any(|b| b.chord == Chord::Plain(Key::Delete)));

    right.focus();
    let mut event = KeyEvent::new(Key::R, Modifiers::ALT);
    let hit = registry.dispatch(&mut event).unwrap();
    assert_eq!(&hit.instance, right.instance());
    assert_eq!(hit.command, ToolboxCommand::SelectTool(2));
    assert!(event.default_prevented());

    let target = if &hit.instance == left.instance() { &mut left } else { &mut right };
    target.execute(hit.command, &mut host).unwrap();
    assert_eq!(right.collection().creating(), Some(DrawingKind::RayLine));
    assert_eq!(left.collection().creating(), None);
    assert_eq!(context.cursor(), CursorStyle::Crosshair);

    let mut undo = KeyEvent::new(Key::Z, Modifiers::COMMAND);
    let hit = registry.dispatch(&mut undo).unwrap();
    assert_eq!(hit.command, ToolboxCommand::UndoLast);
    assert!(!undo.default_prevented());
}

#[test]
fn test_undo_in_one_pane_keeps_the_other_panes_cursor() {
    let mut host = host();
    let context = SharedContext::new();
    let (mut left, _) = toolbox("window.left", &context);
    let (mut right, _) = toolbox("window.right", &context);
    left.load_drawings(BOX).unwrap();
    right.load_drawings(BOX).unwrap();

    left.on_pointer_move(pos2(150.0, 150.0), &mut host);
    assert_eq!(context.cursor(), CursorStyle::Pointer);

    assert!(right.undo_last(&mut host).unwrap());
    assert!(right.collection().is_empty());
    assert_eq!(context.cursor(), CursorStyle::Pointer);
}

#[test]
fn test_drag_persists_moved_points() {
    let mut host = host();
    let context = SharedContext::new();
    let (mut toolbox, log) = toolbox("w", &context);
    toolbox.load_drawings(BOX).unwrap();

    toolbox.on_pointer_move(pos2(150.0, 150.0), &mut host);
    assert_eq!(context.cursor(), CursorStyle::Pointer);
    assert!(toolbox.on_pointer_down(pos2(150.0, 150.0), &mut host).unwrap());
    assert!(toolbox.is_capturing());
    assert!(!host.scroll_enabled());

    toolbox.on_pointer_move(pos2(200.0, 140.0), &mut host);
    assert!(toolbox.on_pointer_up(&mut host).unwrap());
    assert!(host.scroll_enabled());

    let saved = log.last().unwrap();
    assert!(saved.starts_with(
        r#"save_drawingsw_~_[{"type":"Box","points":[{"time":900,"logical":15,"price":410.0},{"time":1500,"logical":25,"price":310.0}]"#
    ));
}

#[test]
fn test_delete_falls_back_to_last_hovered() {
    let mut host = host();
    let context = SharedContext::new();
    let (mut toolbox, log) = toolbox("w", &context);
    toolbox.load_drawings(BOX).unwrap();

    assert!(!toolbox.delete_hovered(&mut host).unwrap());

    toolbox.on_pointer_move(pos2(150.0, 150.0), &mut host);
    toolbox.on_pointer_move(pos2(900.0, 450.0), &mut host);
    assert_eq!(toolbox.collection().hovered(), None);

    assert!(toolbox.delete_hovered(&mut host).unwrap());
    assert!(toolbox.collection().is_empty());
    assert_eq!(log.last().unwrap(), "save_drawingsw_~_[]");
}

#[test]
fn test_unprojectable_points_paint_and_hit_nothing() {
    let mut host = host().with_projectable(0..=50);
    let context = SharedContext::new();
    let (mut toolbox, _) = toolbox("w", &context);
    toolbox
        .load_drawings(
            r#"[{"type":"TrendLine","points":[{"logical":10,"price":400.0},{"logical":80,"price":300.0}],"options":{}}]"#,
        )
        .unwrap();

    let mut canvas = Recorder::default();
    assert_eq!(toolbox.paint(&mut canvas, &host), 0);
    assert!(canvas.calls.is_empty());

    let drawing = toolbox.collection().last().unwrap();
    assert!(!drawing.hit_test(pos2(100.0, 100.0), 10.0));

    toolbox.on_pointer_move(pos2(100.0, 100.0), &mut host);
    assert_eq!(toolbox.collection().hovered(), None);
}

#[test]
fn test_measure_channel_is_independent_of_bulk_save() {
    let mut host = host();
    let context = SharedContext::new();
    let (mut toolbox, log) = toolbox("w", &context);
    toolbox.set_measure_callback(Some("m1".into()));
    let measure = toolbox
        .entries()
        .iter()
        .position(|e| e.kind == DrawingKind::Measure)
        .unwrap();

    toolbox.on_icon_activate(measure, &mut host).unwrap();
    toolbox.on_pointer_down(pos2(100.0, 100.0), &mut host).unwrap();
    toolbox.on_pointer_down(pos2(300.0, 200.0), &mut host).unwrap();
    let id = toolbox.collection().last().unwrap().id();
    log.drain();

    toolbox.delete_drawing(id, &mut host).unwrap();
    let messages = log.drain();
    assert_eq!(
        messages,
        vec![
            r#"m1_~_deleted_~_[{"time":600,"logical":10,"price":400.0},{"time":1800,"logical":30,"price":300.0}]"#
                .to_owned(),
            "save_drawingsw_~_[]".to_owned(),
        ]
    );
}

#[test]
fn test_switching_tools_cancels_pending_measure() {
    let mut host = host();
    let context = SharedContext::new();
    let (mut toolbox, log) = toolbox("w", &context);
    toolbox.set_measure_callback(Some("m1".into()));

    toolbox.on_icon_activate(5, &mut host).unwrap();
    toolbox.on_pointer_down(pos2(100.0, 100.0), &mut host).unwrap();
    toolbox.on_icon_activate(0, &mut host).unwrap();

    let messages = log.drain();
    assert!(messages[0].starts_with("m1_~_created_~_"));
    assert!(messages[1].starts_with("m1_~_deleted_~_"));
    assert_eq!(messages[2], "save_drawingsw_~_[]");
    assert_eq!(toolbox.collection().creating(), Some(DrawingKind::TrendLine));
    assert!(toolbox.collection().is_empty());
}
