//! One chart pane of the demo: a synthetic series on a [`LinearScale`] with a
//! [`Toolbox`] on top.

use egui::{Color32, Key, PointerButton, Pos2, Rect, Shape, Stroke};
use log::{error, info};

use crate::config::ToolboxConfig;
use crate::host::{ChartHost, InstanceId, LinearScale, SharedContext};
use crate::input::{InputEvent, InputHandler};
use crate::persistence::{LoadReport, MessageLog};
use crate::point::Logical;
use crate::tools::{HotkeyRegistry, Toolbox};
use crate::util::time::timestamp_secs;

pub const BAR_INTERVAL: i64 = 60;

const SERIES_COLOR: Color32 = Color32::from_gray(180);

/// Deterministic price walk seeded from `seed`
pub fn synthetic_series(seed: &str, bars: usize) -> Vec<f64> {
    let phase = seed.bytes().map(f64::from).sum::<f64>() / 100.0;
    let base = 50.0 + (phase * 37.0) % 150.0;
    (0..bars)
        .map(|i| {
            let t = i as f64;
            base + 8.0 * (t * 0.05 + phase).sin() + 3.0 * (t * 0.31 + phase * 2.0).sin() + t * 0.02
        })
        .collect()
}

pub struct ChartPane {
    toolbox: Toolbox,
    host: LinearScale,
    series: Vec<f64>,
    input: InputHandler,
    registry: HotkeyRegistry,
}

impl ChartPane {
    /// Build a pane whose controller messages land in `outbox`
    pub fn new(
        instance: InstanceId,
        context: SharedContext,
        outbox: MessageLog,
        config: ToolboxConfig,
        series: Vec<f64>,
    ) -> Self {
        let toolbox = Toolbox::new(instance, context.clone(), outbox, config);
        let mut registry = HotkeyRegistry::new(context);
        toolbox.register_hotkeys(&mut registry);

        let bars = series.len() as i64;
        let base_time = timestamp_secs() - bars * BAR_INTERVAL;
        let host = LinearScale::new(Rect::NOTHING, (bars - 120).max(0) as f64, 8.0, (0.0, 1.0))
            .with_series(base_time, BAR_INTERVAL, bars);

        let mut pane = Self {
            toolbox,
            host,
            series,
            input: InputHandler::new(Rect::NOTHING),
            registry,
        };
        pane.fit_prices();
        pane
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    pub fn toolbox_mut(&mut self) -> &mut Toolbox {
        &mut self.toolbox
    }

    pub fn host(&self) -> &LinearScale {
        &self.host
    }

    /// Toolbox and host together, for calls that need both
    pub fn parts_mut(&mut self) -> (&mut Toolbox, &mut LinearScale) {
        (&mut self.toolbox, &mut self.host)
    }

    /// Swap in another series, dropping the current drawings unsaved, then
    /// load `payload` if given
    pub fn replace_series(&mut self, series: Vec<f64>, payload: Option<&str>) -> LoadReport {
        self.toolbox.clear_drawings(&mut self.host);
        self.series = series;
        self.fit_prices();
        let Some(payload) = payload else {
            return LoadReport::default();
        };
        match self.toolbox.load_drawings(payload) {
            Ok(report) => report,
            Err(err) => {
                error!("Failed to load stored drawings: {err}");
                LoadReport::default()
            }
        }
    }

    fn fit_prices(&mut self) {
        let (low, high) = self
            .series
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        if low <= high {
            let margin = ((high - low) * 0.1).max(1.0);
            self.host.set_price_range(low - margin, high + margin);
        }
        self.toolbox.on_visible_range_changed();
    }

    pub fn set_rect(&mut self, rect: Rect) {
        if self.host.rect() != rect {
            self.host.set_rect(rect);
            self.input.set_chart_rect(rect);
            self.toolbox.on_visible_range_changed();
        }
    }

    /// Translate this frame's egui input and route it
    pub fn handle_input(&mut self, ctx: &egui::Context) {
        for event in self.input.process_input(ctx) {
            self.route_event(event);
        }
    }

    pub fn route_event(&mut self, event: InputEvent) {
        let result = match event {
            InputEvent::PointerDown {
                location,
                button: PointerButton::Primary,
            } if location.is_in_chart => self.toolbox.on_pointer_down(location.position, &mut self.host),
            InputEvent::PointerDown {
                location,
                button: PointerButton::Secondary,
            } if location.is_in_chart => self.delete_under(location.position),
            InputEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } => self.toolbox.on_pointer_up(&mut self.host),
            InputEvent::PointerMove {
                location,
                delta,
                primary_down,
            } => {
                if location.is_in_chart {
                    self.toolbox.focus();
                }
                if primary_down && !self.toolbox.is_capturing() {
                    if location.is_in_chart && self.host.pan(delta.x, delta.y) {
                        self.toolbox.on_visible_range_changed();
                    }
                } else {
                    self.toolbox.on_pointer_move(location.position, &mut self.host);
                }
                Ok(true)
            }
            InputEvent::PointerLeave { .. } => {
                self.toolbox.on_pointer_leave(&mut self.host);
                Ok(true)
            }
            InputEvent::Scroll { location, delta } if location.is_in_chart => {
                let factor = (delta * 0.002).exp();
                if self.host.zoom(factor, location.position.x) {
                    self.toolbox.on_visible_range_changed();
                }
                Ok(true)
            }
            InputEvent::KeyDown(mut key) => {
                if key.key == Key::Escape && self.toolbox.active_index().is_some() {
                    self.toolbox.remove_active_and_save().map(|()| true)
                } else {
                    match self.registry.dispatch(&mut key) {
                        Some(hit) if &hit.instance == self.toolbox.instance() => {
                            self.toolbox.execute(hit.command, &mut self.host)
                        }
                        _ => Ok(false),
                    }
                }
            }
            _ => Ok(false),
        };
        if let Err(err) = result {
            error!("Failed to handle chart input: {err}");
        }
    }

    /// Context action: delete the drawing under the pointer
    fn delete_under(&mut self, pos: Pos2) -> crate::error::PersistenceResult<bool> {
        self.toolbox.on_pointer_move(pos, &mut self.host);
        let Some(id) = self.toolbox.collection().hovered() else {
            return Ok(false);
        };
        match self.toolbox.delete_drawing(id, &mut self.host) {
            Ok(drawing) => {
                info!("Deleted {} from the context action", drawing.kind());
                Ok(true)
            }
            Err(err) => {
                error!("Failed to delete drawing: {err}");
                Ok(false)
            }
        }
    }

    pub fn paint(&mut self, painter: &egui::Painter) {
        let mut canvas = painter.with_clip_rect(self.host.rect());
        canvas.rect_filled(self.host.rect(), 0.0, Color32::from_gray(18));
        canvas.add(Shape::line(self.series_points(), Stroke::new(1.5, SERIES_COLOR)));
        self.toolbox.paint(&mut canvas, &self.host);
    }

    fn series_points(&self) -> Vec<Pos2> {
        let visible = self.host.visible_logicals();
        let first = (*visible.start()).max(0);
        let last = (*visible.end()).min(self.series.len() as Logical - 1);
        (first..=last)
            .filter_map(|logical| {
                let price = *self.series.get(usize::try_from(logical).ok()?)?;
                let x = self.host.logical_to_x(logical)?;
                let y = self.host.price_to_y(price)?;
                Some(Pos2::new(x, y))
            })
            .collect()
    }
}
