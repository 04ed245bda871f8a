//! String framing and JSON records exchanged with the external controller.
//!
//! Two independent outbound channels exist: the bulk drawing-set save of a
//! toolbox instance, and per-measurement lifecycle events. Both are plain
//! strings parsed positionally on the other side, so the framing below must
//! not change.

mod controller;

pub use controller::{ControllerMessage, DrawingStore};

use std::fmt;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::ToolboxConfig;
use crate::drawing::{Drawing, DrawingKind, LifecycleEvent};
use crate::error::{DrawingError, PersistenceResult};
use crate::host::InstanceId;
use crate::point::Point;

/// Separator between the fields of every outbound message
pub const FIELD_SEPARATOR: &str = "_~_";

/// Command prefix of the bulk save, followed directly by the instance id
pub const SAVE_COMMAND: &str = "save_drawings";

/// One persisted drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingRecord {
    #[serde(rename = "type", alias = "typeTag")]
    pub type_tag: String,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub options: Value,
}

impl DrawingRecord {
    pub fn from_drawing(drawing: &Drawing) -> Self {
        Self {
            type_tag: drawing.kind().tag().to_owned(),
            points: drawing.points().to_vec(),
            options: drawing.options().to_value(),
        }
    }

    /// Rebuild the drawing, laying the stored options over the defaults
    pub fn to_drawing(&self, config: &ToolboxConfig) -> Result<Drawing, SkipReason> {
        let kind = DrawingKind::from_tag(&self.type_tag)
            .ok_or_else(|| SkipReason::UnknownType(self.type_tag.clone()))?;
        Drawing::from_partial(kind, self.points.clone(), &self.options, config)
            .map_err(|e: DrawingError| SkipReason::Malformed(e.to_string()))
    }
}

/// Why a persisted entry was not loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("unknown drawing type {0:?}")]
    UnknownType(String),
    #[error("malformed entry: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the loaded list
    pub index: usize,
    pub reason: SkipReason,
}

/// Outcome of loading a drawing list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedEntry>,
}

impl LoadReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} loaded, {} skipped", self.loaded, self.skipped.len())
    }
}

/// Records of `drawings` in collection order
pub fn records<'a>(drawings: impl IntoIterator<Item = &'a Drawing>) -> Vec<DrawingRecord> {
    drawings.into_iter().map(DrawingRecord::from_drawing).collect()
}

/// `save_drawings<instance>_~_<json records>`
pub fn save_message(instance: &InstanceId, records: &[DrawingRecord]) -> PersistenceResult<String> {
    let payload = serde_json::to_string(records)?;
    Ok(format!("{SAVE_COMMAND}{instance}{FIELD_SEPARATOR}{payload}"))
}

/// `<callback>_~_<created|updated|deleted>_~_<json points>`
pub fn lifecycle_message(event: &LifecycleEvent) -> PersistenceResult<String> {
    let points = serde_json::to_string(&event.points)?;
    Ok(format!(
        "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{points}",
        event.callback,
        event.kind.as_str()
    ))
}

/// Rebuild drawings from a JSON array of records.
///
/// Entries that cannot be rebuilt are skipped and reported; the rest still
/// load. Only a payload that is not an array at all is an error.
pub fn parse_drawings(
    payload: &str,
    config: &ToolboxConfig,
) -> PersistenceResult<(Vec<Drawing>, LoadReport)> {
    let entries: Vec<Value> = serde_json::from_str(payload)?;
    Ok(drawings_from_values(entries, config))
}

pub fn drawings_from_values(
    entries: Vec<Value>,
    config: &ToolboxConfig,
) -> (Vec<Drawing>, LoadReport) {
    let mut drawings = Vec::with_capacity(entries.len());
    let mut report = LoadReport::default();

    for (index, entry) in entries.into_iter().enumerate() {
        let rebuilt = serde_json::from_value::<DrawingRecord>(entry)
            .map_err(|e| SkipReason::Malformed(e.to_string()))
            .and_then(|record| record.to_drawing(config));
        match rebuilt {
            Ok(drawing) => drawings.push(drawing),
            Err(reason) => {
                warn!("Skipping drawing entry {index}: {reason}");
                report.skipped.push(SkippedEntry { index, reason });
            }
        }
    }

    report.loaded = drawings.len();
    info!("Parsed drawing list: {report}");
    (drawings, report)
}

/// Outbound string channel to the controller
pub trait ControllerSink {
    fn send(&mut self, message: String);
}

impl<F: FnMut(String)> ControllerSink for F {
    fn send(&mut self, message: String) {
        (*self)(message)
    }
}

/// Sink that keeps every message; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }
}

impl ControllerSink for MessageLog {
    fn send(&mut self, message: String) {
        self.messages.lock().push(message);
    }
}
