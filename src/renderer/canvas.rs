use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke};

use crate::drawing::LineStyle;

/// Paint target of the drawing renderer.
///
/// Everything is in pixel coordinates; the renderer never converts chart
/// positions itself.
pub trait Canvas {
    /// Area the chart pane occupies
    fn bounds(&self) -> Rect;

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, style: LineStyle);

    fn fill_rect(&mut self, rect: Rect, color: Color32);

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke);

    /// Text centred on `pos`
    fn text(&mut self, pos: Pos2, text: &str, color: Color32);

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke, style: LineStyle) {
        let [a, b, c, d] = [
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
        ];
        self.line(a, b, stroke, style);
        self.line(b, c, stroke, style);
        self.line(c, d, stroke, style);
        self.line(d, a, stroke, style);
    }
}

const LABEL_FONT_SIZE: f32 = 12.0;

impl Canvas for Painter {
    fn bounds(&self) -> Rect {
        self.clip_rect()
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke, style: LineStyle) {
        match style.dash_pattern(stroke.width) {
            None => {
                self.line_segment([from, to], stroke);
            }
            Some((dash, gap)) => {
                self.extend(Shape::dashed_line(&[from, to], stroke, dash, gap));
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.rect_filled(rect, 0.0, color);
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        Painter::circle(self, center, radius, fill, stroke);
    }

    fn text(&mut self, pos: Pos2, text: &str, color: Color32) {
        Painter::text(
            self,
            pos,
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(LABEL_FONT_SIZE),
            color,
        );
    }
}
