#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod collection;
pub mod components;
pub mod config;
pub mod drawing;
pub mod error;
pub mod geometry;
pub mod host;
pub mod input;
pub mod interaction;
pub mod pane;
pub mod panels;
pub mod persistence;
pub mod point;
pub mod renderer;
pub mod tools;
pub mod util;
pub mod view;

pub use app::ChartDemoApp;
pub use collection::{ClickOutcome, DrawingCollection};
pub use config::{AxisMode, ToolboxConfig};
pub use drawing::{Drawing, DrawingId, DrawingKind, DrawingOptions, LifecycleEvent, LifecycleKind};
pub use error::{DrawingError, PersistenceError, ToolboxError};
pub use host::{ChartHost, CursorStyle, InstanceId, LinearScale, SharedContext};
pub use input::{InputEvent, InputLocation};
pub use persistence::{ControllerSink, DrawingRecord, DrawingStore, LoadReport, MessageLog};
pub use point::Point;
pub use renderer::{Canvas, Renderer};
pub use tools::{HotkeyRegistry, KeyEvent, ToolEntry, Toolbox};
