use crate::ChartDemoApp;

pub fn central_panel(app: &mut ChartDemoApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(app.symbol());
            ui.label(app.status());
        });

        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let Some(pane) = app.pane_mut() else {
            return;
        };

        pane.set_rect(response.rect);
        pane.handle_input(ctx);
        if response.hovered() {
            let cursor = pane.toolbox().context().cursor();
            ctx.set_cursor_icon(cursor.to_cursor_icon());
        }
        pane.paint(&painter);
    });
}
