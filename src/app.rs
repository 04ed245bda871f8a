use log::{info, warn};

use crate::config::ToolboxConfig;
use crate::drawing::LengthDisplay;
use crate::host::{InstanceId, SharedContext};
use crate::pane::{ChartPane, synthetic_series};
use crate::panels::{central_panel, tools_panel};
use crate::persistence::{ControllerMessage, DrawingStore, MessageLog};
use crate::renderer::price_change_percent;

pub const SYMBOLS: [&str; 4] = ["AAPL", "MSFT", "EURUSD", "BTCUSD"];

const SERIES_BARS: usize = 400;
const INSTANCE: &str = "window.chart";
const MEASURE_CALLBACK: &str = "measure_chart";

#[cfg(not(target_arch = "wasm32"))]
pub const EXPORT_PATH: &str = "drawings.json";

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct ChartDemoApp {
    store: DrawingStore,
    config: ToolboxConfig,
    symbol: String,
    #[serde(skip)]
    pane: Option<ChartPane>,
    /// Controller side of the toolbox's outbound channel
    #[serde(skip)]
    outbox: MessageLog,
    #[serde(skip)]
    status: String,
}

impl Default for ChartDemoApp {
    fn default() -> Self {
        Self {
            store: DrawingStore::new(),
            config: ToolboxConfig {
                measure_callback: Some(MEASURE_CALLBACK.to_owned()),
                ..Default::default()
            },
            symbol: SYMBOLS[0].to_owned(),
            pane: None,
            outbox: MessageLog::new(),
            status: String::new(),
        }
    }
}

impl ChartDemoApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        app.open_pane();
        app
    }

    fn open_pane(&mut self) {
        self.pane = Some(ChartPane::new(
            InstanceId::new(INSTANCE),
            SharedContext::new(),
            self.outbox.clone(),
            self.config.clone(),
            synthetic_series(&self.symbol, SERIES_BARS),
        ));
        let symbol = self.symbol.clone();
        self.select_symbol(&symbol);
    }

    pub fn pane(&self) -> Option<&ChartPane> {
        self.pane.as_ref()
    }

    pub fn pane_mut(&mut self) -> Option<&mut ChartPane> {
        self.pane.as_mut()
    }

    pub fn store(&self) -> &DrawingStore {
        &self.store
    }

    pub fn config(&self) -> &ToolboxConfig {
        &self.config
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Show another symbol: drop the pane's drawings without saving, then
    /// load whatever the store holds for `symbol`
    pub fn select_symbol(&mut self, symbol: &str) {
        self.pump_messages();
        self.symbol = symbol.to_owned();
        self.store.save_under(symbol);
        let payload = self.store.payload_for(symbol);
        if let Some(pane) = &mut self.pane {
            let report = pane.replace_series(synthetic_series(symbol, SERIES_BARS), payload.as_deref());
            self.status = format!("{symbol}: {report}");
        }
        // Lifecycle events of the cleared drawings
        self.pump_messages();
    }

    pub fn set_length_display(&mut self, display: LengthDisplay) {
        self.config.measure_length_display = display;
        if let Some(pane) = &mut self.pane {
            pane.toolbox_mut().set_measure_length_display(display);
        }
    }

    /// Hand every queued toolbox message to the store
    pub fn pump_messages(&mut self) {
        for message in self.outbox.drain() {
            match self.store.handle_message(&message) {
                Ok(ControllerMessage::Lifecycle {
                    callback,
                    kind,
                    points,
                }) => {
                    self.status = match points.as_slice() {
                        [p1, p2] => format!(
                            "{callback} {}: {:.2}%",
                            kind.as_str(),
                            price_change_percent(p1, p2)
                        ),
                        _ => format!("{callback} {}", kind.as_str()),
                    };
                }
                Ok(ControllerMessage::SaveDrawings { instance, .. }) => {
                    info!("Stored drawings of {instance} under {}", self.symbol);
                }
                Err(err) => warn!("Ignoring controller message: {err}"),
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn export_store(&mut self) {
        self.status = match self.store.export(EXPORT_PATH) {
            Ok(()) => format!("Exported to {EXPORT_PATH}"),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn import_store(&mut self) {
        match self.store.import(EXPORT_PATH) {
            Ok(true) => {
                let symbol = self.symbol.clone();
                self.select_symbol(&symbol);
            }
            Ok(false) => self.status = format!("{EXPORT_PATH} not found"),
            Err(err) => self.status = format!("Import failed: {err}"),
        }
    }
}

impl eframe::App for ChartDemoApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.pump_messages();
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        tools_panel(self, ctx);
        central_panel(self, ctx);
        self.pump_messages();
    }
}
