use crate::ChartDemoApp;
use crate::app::SYMBOLS;
use crate::components::ToolButton;
use crate::drawing::LengthDisplay;

pub fn tools_panel(app: &mut ChartDemoApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Tools");

            if let Some(pane) = app.pane_mut() {
                let (toolbox, host) = pane.parts_mut();
                let active = toolbox.active_index();

                let mut clicked = None;
                ui.horizontal_wrapped(|ui| {
                    for (index, entry) in toolbox.entries().iter().enumerate() {
                        if ToolButton::new(entry, active == Some(index)).show(ui).clicked() {
                            clicked = Some(index);
                        }
                    }
                });
                if let Some(index) = clicked {
                    log::info!("Tool selected from UI: {index}");
                    if let Err(err) = toolbox.on_icon_activate(index, host) {
                        log::error!("Failed to toggle tool: {err}");
                    }
                }
                ui.separator();

                ui.label(format!("Drawings: {}", toolbox.collection().len()));
                ui.horizontal(|ui| {
                    let has_drawings = !toolbox.collection().is_empty();
                    let undo = ui.add_enabled(has_drawings, egui::Button::new("Undo")).clicked();
                    let save = ui.button("Save").clicked();
                    let result = if undo {
                        toolbox.undo_last(host).map(|_| ())
                    } else if save {
                        toolbox.save_drawings()
                    } else {
                        Ok(())
                    };
                    if let Err(err) = result {
                        log::error!("Failed to save drawings: {err}");
                    }
                    if ui.add_enabled(has_drawings, egui::Button::new("Clear")).clicked() {
                        toolbox.clear_drawings(host);
                    }
                });
            }
            ui.separator();

            ui.heading("Symbol");
            let mut selected = None;
            for symbol in SYMBOLS {
                if ui.selectable_label(app.symbol() == symbol, symbol).clicked() {
                    selected = Some(symbol);
                }
            }
            if let Some(symbol) = selected {
                app.select_symbol(symbol);
            }
            ui.separator();

            ui.heading("Measure length");
            let mut display = app.config().measure_length_display;
            ui.horizontal(|ui| {
                ui.radio_value(&mut display, LengthDisplay::Time, "Time");
                ui.radio_value(&mut display, LengthDisplay::Bars, "Bars");
                ui.radio_value(&mut display, LengthDisplay::Both, "Both");
            });
            if display != app.config().measure_length_display {
                app.set_length_display(display);
            }
            ui.separator();

            ui.heading("Stored drawings");
            egui::Grid::new("stored_sets_grid")
                .num_columns(2)
                .spacing([40.0, 4.0])
                .striped(true)
                .show(ui, |ui| {
                    ui.strong("Symbol");
                    ui.strong("Drawings");
                    ui.end_row();

                    for tag in app.store().tags() {
                        ui.label(tag);
                        ui.label(app.store().count(tag).to_string());
                        ui.end_row();
                    }
                });

            #[cfg(not(target_arch = "wasm32"))]
            ui.horizontal(|ui| {
                if ui.button("Export").clicked() {
                    app.export_store();
                }
                if ui.button("Import").clicked() {
                    app.import_store();
                }
            });
        });
}
