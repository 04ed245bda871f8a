use egui::{Context, PointerButton, Pos2, Rect};

use crate::tools::KeyEvent;

/// Represents the location where an input event occurred
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputLocation {
    /// The position in screen coordinates
    pub position: Pos2,
    /// Whether this position is within the chart's plot rect
    pub is_in_chart: bool,
}

/// Pointer and key input of one frame, in the order the chart pane consumes it
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        location: InputLocation,
        button: PointerButton,
    },
    PointerUp {
        location: InputLocation,
        button: PointerButton,
    },
    /// Mouse moved (with or without buttons pressed)
    PointerMove {
        location: InputLocation,
        /// Movement since the previous frame
        delta: egui::Vec2,
        primary_down: bool,
    },
    /// Pointer left the window
    PointerLeave { last_known_location: InputLocation },
    /// Mouse wheel, positive when scrolling up
    Scroll { location: InputLocation, delta: f32 },
    /// Key press (repeats excluded)
    KeyDown(KeyEvent),
}

impl InputEvent {
    /// Helper to check if an input event occurred within the chart
    pub fn is_in_chart(&self) -> bool {
        match self {
            InputEvent::PointerDown { location, .. }
            | InputEvent::PointerUp { location, .. }
            | InputEvent::PointerMove { location, .. }
            | InputEvent::Scroll { location, .. } => location.is_in_chart,
            InputEvent::PointerLeave {
                last_known_location,
            } => last_known_location.is_in_chart,
            InputEvent::KeyDown(_) => false,
        }
    }
}

/// Converts raw egui input into [`InputEvent`]s for the chart pane
#[derive(Debug, Clone)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    chart_rect: Rect,
}

impl InputHandler {
    pub fn new(chart_rect: Rect) -> Self {
        Self {
            last_pointer_pos: None,
            chart_rect,
        }
    }

    /// Update the plot rect (e.g. if window is resized)
    pub fn set_chart_rect(&mut self, rect: Rect) {
        self.chart_rect = rect;
    }

    fn make_location(&self, pos: Pos2) -> InputLocation {
        InputLocation {
            position: pos,
            is_in_chart: self.chart_rect.contains(pos),
        }
    }

    pub fn process_input(&mut self, ctx: &Context) -> Vec<InputEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            match (input.pointer.hover_pos(), self.last_pointer_pos) {
                (Some(pos), last) => {
                    if Some(pos) != last {
                        events.push(InputEvent::PointerMove {
                            location: self.make_location(pos),
                            delta: last.map_or(egui::Vec2::ZERO, |last| pos - last),
                            primary_down: input.pointer.primary_down(),
                        });
                    }
                    self.last_pointer_pos = Some(pos);
                }
                (None, Some(last)) => {
                    events.push(InputEvent::PointerLeave {
                        last_known_location: self.make_location(last),
                    });
                    self.last_pointer_pos = None;
                }
                (None, None) => {}
            }

            if let Some(pos) = input.pointer.hover_pos() {
                for button in [PointerButton::Primary, PointerButton::Secondary] {
                    if input.pointer.button_pressed(button) {
                        events.push(InputEvent::PointerDown {
                            location: self.make_location(pos),
                            button,
                        });
                    }
                }
            }
            // Releases count wherever the pointer is
            for button in [PointerButton::Primary, PointerButton::Secondary] {
                if input.pointer.button_released(button) {
                    let pos = input
                        .pointer
                        .hover_pos()
                        .or(self.last_pointer_pos)
                        .unwrap_or_default();
                    events.push(InputEvent::PointerUp {
                        location: self.make_location(pos),
                        button,
                    });
                }
            }

            let scroll = input.smooth_scroll_delta.y;
            if scroll != 0.0 {
                if let Some(pos) = input.pointer.hover_pos() {
                    events.push(InputEvent::Scroll {
                        location: self.make_location(pos),
                        delta: scroll,
                    });
                }
            }

            for event in &input.raw.events {
                if let egui::Event::Key {
                    key,
                    pressed: true,
                    repeat: false,
                    modifiers,
                    ..
                } = event
                {
                    events.push(InputEvent::KeyDown(KeyEvent::new(*key, *modifiers)));
                }
            }
        });

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Event, Key, Modifiers, RawInput, pos2};

    fn run(ctx: &Context, handler: &mut InputHandler, events: Vec<Event>) -> Vec<InputEvent> {
        let mut out = Vec::new();
        let raw = RawInput {
            events,
            ..Default::default()
        };
        let _ = ctx.run(raw, |ctx| out = handler.process_input(ctx));
        out
    }

    #[test]
    fn test_pointer_and_keys() {
        let ctx = Context::default();
        let mut handler =
            InputHandler::new(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0)));

        let events = run(
            &ctx,
            &mut handler,
            vec![Event::PointerMoved(pos2(10.0, 20.0))],
        );
        assert!(matches!(
            events.as_slice(),
            [InputEvent::PointerMove { location, .. }] if location.is_in_chart
        ));

        let events = run(
            &ctx,
            &mut handler,
            vec![Event::Key {
                key: Key::T,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: Modifiers::ALT,
            }],
        );
        assert_eq!(
            events,
            vec![InputEvent::KeyDown(KeyEvent::new(Key::T, Modifiers::ALT))]
        );

        let events = run(&ctx, &mut handler, vec![Event::PointerGone]);
        assert!(matches!(
            events.as_slice(),
            [InputEvent::PointerLeave { .. }]
        ));
    }
}
