//! Paint layer.
//!
//! Consumes projected pixel coordinates plus resolved options and paints onto
//! a [`Canvas`]. Missing coordinates or unparsable colours skip the affected
//! element for the frame; painting never fails.

mod canvas;
mod color;

pub use canvas::Canvas;
pub use color::parse_css_color;

use egui::{Color32, Pos2, Rect, Stroke, pos2, vec2};

use crate::drawing::options::{BoxOptions, LineOptions, MeasureOptions};
use crate::drawing::{Drawing, DrawingKind, DrawingOptions, LengthDisplay};
use crate::geometry::hit_testing::box_corners;
use crate::point::Point;
use crate::util::time::format_elapsed;
use crate::view::DrawingView;

const GAIN_FILL: &str = "rgba(0, 200, 0, 0.1)";
const LOSS_FILL: &str = "rgba(200, 0, 0, 0.1)";
const LABEL_OFFSET: f32 = 10.0;

/// What the renderer needs to paint one drawing
#[derive(Debug, Clone, Copy)]
pub struct PaintInput<'a> {
    pub kind: DrawingKind,
    pub view: &'a DrawingView,
    pub options: &'a DrawingOptions,
    /// Chart-space points, for derived labels only
    pub points: &'a [Point],
    pub hovered: bool,
}

impl<'a> From<&'a Drawing> for PaintInput<'a> {
    fn from(drawing: &'a Drawing) -> Self {
        Self {
            kind: drawing.kind(),
            view: drawing.view(),
            options: drawing.options(),
            points: drawing.points(),
            hovered: drawing.hovered(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    handle_radius: f32,
    label_color: Color32,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl Renderer {
    pub fn new(handle_radius: f32) -> Self {
        Self {
            handle_radius,
            label_color: Color32::WHITE,
        }
    }

    pub fn with_label_color(mut self, color: Color32) -> Self {
        self.label_color = color;
        self
    }

    /// Paint one drawing. Returns `false` when it was skipped for this frame.
    pub fn paint(&self, canvas: &mut dyn Canvas, input: &PaintInput<'_>) -> bool {
        let painted = match (input.kind, input.options) {
            (DrawingKind::HorizontalLine, DrawingOptions::Line(o)) => {
                self.paint_horizontal(canvas, input, o, false)
            }
            (DrawingKind::RayLine, DrawingOptions::Line(o)) => {
                self.paint_horizontal(canvas, input, o, true)
            }
            (DrawingKind::VerticalLine, DrawingOptions::Line(o)) => {
                self.paint_vertical(canvas, input, o)
            }
            (DrawingKind::TrendLine, DrawingOptions::Line(o)) => self.paint_trend(canvas, input, o),
            (DrawingKind::VerticalSpan, DrawingOptions::Line(o)) => paint_span(canvas, input, o),
            (DrawingKind::Box, DrawingOptions::Box(o)) => self.paint_box(canvas, input, o),
            (DrawingKind::Measure, DrawingOptions::Measure(o)) => {
                self.paint_measure(canvas, input, o)
            }
            _ => None,
        };
        painted.is_some()
    }

    fn paint_horizontal(
        &self,
        canvas: &mut dyn Canvas,
        input: &PaintInput<'_>,
        options: &LineOptions,
        ray: bool,
    ) -> Option<()> {
        let bounds = canvas.bounds();
        let y = input.view.first().y?;
        let stroke = line_stroke(&options.line_color, options.width)?;
        let start_x = if ray { input.view.first().x? } else { bounds.left() };

        canvas.line(pos2(start_x, y), pos2(bounds.right(), y), stroke, options.line_style);
        if !options.text.is_empty() {
            let x = if ray { start_x } else { bounds.left() };
            canvas.text(pos2(x + 40.0, y - LABEL_OFFSET), &options.text, stroke.color);
        }
        if input.hovered {
            if let Some(pos) = input.view.first().pos() {
                self.paint_handles(canvas, &[pos], stroke.color);
            }
        }
        Some(())
    }

    fn paint_vertical(
        &self,
        canvas: &mut dyn Canvas,
        input: &PaintInput<'_>,
        options: &LineOptions,
    ) -> Option<()> {
        let bounds = canvas.bounds();
        let x = input.view.first().x?;
        let stroke = line_stroke(&options.line_color, options.width)?;

        canvas.line(pos2(x, bounds.top()), pos2(x, bounds.bottom()), stroke, options.line_style);
        if !options.text.is_empty() {
            canvas.text(pos2(x, bounds.top() + LABEL_OFFSET), &options.text, stroke.color);
        }
        if input.hovered {
            if let Some(pos) = input.view.first().pos() {
                self.paint_handles(canvas, &[pos], stroke.color);
            }
        }
        Some(())
    }

    fn paint_trend(
        &self,
        canvas: &mut dyn Canvas,
        input: &PaintInput<'_>,
        options: &LineOptions,
    ) -> Option<()> {
        let (p1, p2) = input.view.resolved_pair()?;
        let stroke = line_stroke(&options.line_color, options.width)?;
        canvas.line(p1, p2, stroke, options.line_style);
        if input.hovered {
            self.paint_handles(canvas, &[p1, p2], stroke.color);
        }
        Some(())
    }

    fn paint_box(
        &self,
        canvas: &mut dyn Canvas,
        input: &PaintInput<'_>,
        options: &BoxOptions,
    ) -> Option<()> {
        let (p1, p2) = input.view.resolved_pair()?;
        let rect = Rect::from_two_pos(p1, p2);
        if options.fill_enabled {
            if let Some(fill) = parse_css_color(&options.fill_color) {
                canvas.fill_rect(rect, fill);
            }
        }
        let stroke = line_stroke(&options.line_color, options.width);
        if let Some(stroke) = stroke {
            canvas.stroke_rect(rect, stroke, options.line_style);
        }
        if input.hovered {
            let color = stroke.map_or(Color32::WHITE, |s| s.color);
            self.paint_handles(canvas, &box_corners(p1, p2), color);
        }
        Some(())
    }

    fn paint_measure(
        &self,
        canvas: &mut dyn Canvas,
        input: &PaintInput<'_>,
        options: &MeasureOptions,
    ) -> Option<()> {
        let (p1, p2) = input.view.resolved_pair()?;
        let [point1, point2] = input.points else {
            return None;
        };
        let rect = Rect::from_two_pos(p1, p2);
        let change = price_change_percent(point1, point2);

        if options.fill_enabled {
            let fill = if change > 0.0 {
                GAIN_FILL
            } else if change < 0.0 {
                LOSS_FILL
            } else {
                options.fill_color.as_str()
            };
            if let Some(fill) = parse_css_color(fill) {
                canvas.fill_rect(rect, fill);
            }
        }
        let stroke = line_stroke(&options.line_color, options.width);
        if let Some(stroke) = stroke {
            canvas.stroke_rect(rect, stroke, options.line_style);
        }

        let labels = measure_labels(point1, point2, options.length_display);
        let center_x = rect.center().x;
        canvas.text(pos2(center_x, rect.top() - LABEL_OFFSET), &labels.price, self.label_color);
        canvas.text(
            pos2(center_x, rect.bottom() + LABEL_OFFSET),
            &labels.length,
            self.label_color,
        );

        if input.hovered {
            let color = stroke.map_or(Color32::WHITE, |s| s.color);
            self.paint_handles(canvas, &box_corners(p1, p2), color);
        }
        Some(())
    }

    fn paint_handles(&self, canvas: &mut dyn Canvas, positions: &[Pos2], color: Color32) {
        let border = Stroke::new(1.0, Color32::WHITE);
        for &pos in positions {
            canvas.circle(pos, self.handle_radius, color, border);
        }
    }
}

// Spans ignore price, so only the two x positions have to resolve.
fn paint_span(canvas: &mut dyn Canvas, input: &PaintInput<'_>, options: &LineOptions) -> Option<()> {
    let bounds = canvas.bounds();
    let x1 = input.view.first().x?;
    let x2 = input.view.second().x?;
    let color = parse_css_color(&options.line_color)?;
    let left = x1.min(x2);
    let width = (x1 - x2).abs().max(1.0);
    canvas.fill_rect(
        Rect::from_min_size(pos2(left, bounds.top()), vec2(width, bounds.height())),
        color,
    );
    Some(())
}

fn line_stroke(color: &str, width: f32) -> Option<Stroke> {
    if width <= 0.0 {
        return None;
    }
    Some(Stroke::new(width, parse_css_color(color)?))
}

/// Relative move from the first to the second point's price, in percent of
/// the first price. Positive when the second price lies below the first.
pub fn price_change_percent(p1: &Point, p2: &Point) -> f64 {
    if p1.price == 0.0 {
        return 0.0;
    }
    (p1.price - p2.price) / p1.price * 100.0
}

/// Text painted above and below a measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureLabels {
    pub price: String,
    pub length: String,
}

/// The time part is left out of `Both`, and reads `n/a` in `Time`, when
/// either point has no resolved time.
pub fn measure_labels(p1: &Point, p2: &Point, display: LengthDisplay) -> MeasureLabels {
    let time = match (p1.time, p2.time) {
        (Some(t1), Some(t2)) => Some(format!("Time: {}", format_elapsed(t2 - t1))),
        _ => None,
    };
    let bars = format!("Bars: {}", (p2.logical - p1.logical).abs());

    MeasureLabels {
        price: format!("Price: {:.2}%", price_change_percent(p1, p2)),
        length: match (display, time) {
            (LengthDisplay::Time, Some(time)) => time,
            (LengthDisplay::Time, None) => "Time: n/a".to_owned(),
            (LengthDisplay::Bars, _) | (LengthDisplay::Both, None) => bars,
            (LengthDisplay::Both, Some(time)) => format!("{time}, {bars}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewPoint;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Line(Pos2, Pos2),
        Fill(Rect, Color32),
        Circle(Pos2),
        Text(String),
    }

    struct Recorder {
        bounds: Rect,
        calls: Vec<Call>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                bounds: Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 400.0)),
                calls: Vec::new(),
            }
        }
    }

    impl Canvas for Recorder {
        fn bounds(&self) -> Rect {
            self.bounds
        }

        fn line(&mut self, from: Pos2, to: Pos2, _stroke: Stroke, _style: crate::drawing::LineStyle) {
            self.calls.push(Call::Line(from, to));
        }

        fn fill_rect(&mut self, rect: Rect, color: Color32) {
            self.calls.push(Call::Fill(rect, color));
        }

        fn circle(&mut self, center: Pos2, _radius: f32, _fill: Color32, _stroke: Stroke) {
            self.calls.push(Call::Circle(center));
        }

        fn text(&mut self, _pos: Pos2, text: &str, _color: Color32) {
            self.calls.push(Call::Text(text.to_owned()));
        }
    }

    fn defaults(kind: DrawingKind) -> DrawingOptions {
        DrawingOptions::defaults_for(kind, &Default::default())
    }

    #[test]
    fn test_ray_runs_to_right_edge() {
        let view = DrawingView::from_points(vec![ViewPoint::new(300.0, 120.0)]);
        let options = defaults(DrawingKind::RayLine);
        let points = [Point::at(30, 10.0)];
        let mut canvas = Recorder::new();
        let input = PaintInput {
            kind: DrawingKind::RayLine,
            view: &view,
            options: &options,
            points: &points,
            hovered: false,
        };
        assert!(Renderer::default().paint(&mut canvas, &input));
        assert_eq!(canvas.calls, vec![Call::Line(pos2(300.0, 120.0), pos2(800.0, 120.0))]);
    }

    #[test]
    fn test_hovered_box_paints_four_handles() {
        let view = DrawingView::from_points(vec![
            ViewPoint::new(100.0, 100.0),
            ViewPoint::new(200.0, 50.0),
        ]);
        let options = defaults(DrawingKind::Box);
        let points = [Point::at(10, 400.0), Point::at(20, 450.0)];
        let mut canvas = Recorder::new();
        let input = PaintInput {
            kind: DrawingKind::Box,
            view: &view,
            options: &options,
            points: &points,
            hovered: true,
        };
        Renderer::default().paint(&mut canvas, &input);

        let circles = canvas
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Circle(_)))
            .count();
        assert_eq!(circles, 4);
        assert!(matches!(canvas.calls[0], Call::Fill(..)));
    }

    #[test]
    fn test_measure_fill_follows_price_direction() {
        let view = DrawingView::from_points(vec![
            ViewPoint::new(100.0, 100.0),
            ViewPoint::new(200.0, 150.0),
        ]);
        let options = defaults(DrawingKind::Measure);
        let falling = [Point::at(10, 200.0), Point::at(20, 150.0)];
        let mut canvas = Recorder::new();
        let input = PaintInput {
            kind: DrawingKind::Measure,
            view: &view,
            options: &options,
            points: &falling,
            hovered: false,
        };
        Renderer::default().paint(&mut canvas, &input);

        let gain = parse_css_color(GAIN_FILL).unwrap();
        assert!(canvas.calls.contains(&Call::Fill(
            Rect::from_two_pos(pos2(100.0, 100.0), pos2(200.0, 150.0)),
            gain
        )));
        assert!(canvas.calls.contains(&Call::Text("Price: 25.00%".into())));
        assert!(canvas.calls.contains(&Call::Text("Bars: 10".into())));
    }

    #[test]
    fn test_measure_labels_modes() {
        let p1 = Point::new(Some(0), 3, 100.0);
        let p2 = Point::new(Some(7_500), 1, 110.0);
        let labels = measure_labels(&p1, &p2, LengthDisplay::Time);
        assert_eq!(labels.price, "Price: -10.00%");
        assert_eq!(labels.length, "Time: 2h 5m");
        assert_eq!(measure_labels(&p1, &p2, LengthDisplay::Bars).length, "Bars: 2");
        assert_eq!(measure_labels(&p1, &p2, LengthDisplay::Both).length, "Time: 2h 5m, Bars: 2");
    }

    #[test]
    fn test_measure_labels_without_time() {
        let p1 = Point::new(Some(0), 190, 100.0);
        let p2 = Point::new(None, 260, 100.0);
        assert_eq!(measure_labels(&p1, &p2, LengthDisplay::Both).length, "Bars: 70");
        assert_eq!(measure_labels(&p1, &p2, LengthDisplay::Time).length, "Time: n/a");
        assert_eq!(measure_labels(&p2, &p1, LengthDisplay::Bars).length, "Bars: 70");
    }

    #[test]
    fn test_span_needs_only_x() {
        let view = DrawingView::from_points(vec![
            ViewPoint { x: Some(300.0), y: None },
            ViewPoint { x: Some(100.0), y: None },
        ]);
        let options = defaults(DrawingKind::VerticalSpan);
        let points = [Point::at(30, 0.0), Point::at(10, 0.0)];
        let mut canvas = Recorder::new();
        let input = PaintInput {
            kind: DrawingKind::VerticalSpan,
            view: &view,
            options: &options,
            points: &points,
            hovered: false,
        };
        assert!(Renderer::default().paint(&mut canvas, &input));
        let Call::Fill(rect, _) = &canvas.calls[0] else {
            panic!("expected a fill");
        };
        assert_eq!(rect.left(), 100.0);
        assert_eq!(rect.width(), 200.0);
        assert_eq!(rect.height(), 400.0);
    }

    #[test]
    fn test_bad_color_paints_nothing() {
        let view = DrawingView::from_points(vec![ViewPoint::new(0.0, 0.0), ViewPoint::new(5.0, 5.0)]);
        let options = defaults(DrawingKind::TrendLine).merged(&serde_json::json!({"lineColor": "nope"}));
        let points = [Point::at(0, 0.0), Point::at(1, 1.0)];
        let mut canvas = Recorder::new();
        let input = PaintInput {
            kind: DrawingKind::TrendLine,
            view: &view,
            options: &options,
            points: &points,
            hovered: true,
        };
        assert!(!Renderer::default().paint(&mut canvas, &input));
        assert!(canvas.calls.is_empty());
    }
}
