use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use super::{FIELD_SEPARATOR, SAVE_COMMAND};
use crate::drawing::LifecycleKind;
use crate::error::{PersistenceError, PersistenceResult};
use crate::point::Point;

/// A message as received by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerMessage {
    /// Bulk save of one toolbox instance's drawing set
    SaveDrawings { instance: String, drawings: Value },
    /// Lifecycle event of a callback-bound measurement
    Lifecycle {
        callback: String,
        kind: LifecycleKind,
        points: Vec<Point>,
    },
}

impl ControllerMessage {
    /// Decode either framing positionally
    pub fn parse(message: &str) -> PersistenceResult<Self> {
        let malformed = || PersistenceError::MalformedMessage(truncate(message));

        if let Some(rest) = message.strip_prefix(SAVE_COMMAND) {
            let (instance, payload) = rest.split_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
            return Ok(Self::SaveDrawings {
                instance: instance.to_owned(),
                drawings: serde_json::from_str(payload)?,
            });
        }

        let mut fields = message.splitn(3, FIELD_SEPARATOR);
        let (Some(callback), Some(event), Some(payload)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };
        let kind = LifecycleKind::parse(event).ok_or_else(malformed)?;
        Ok(Self::Lifecycle {
            callback: callback.to_owned(),
            kind,
            points: serde_json::from_str(payload)?,
        })
    }
}

fn truncate(message: &str) -> String {
    message.chars().take(80).collect()
}

/// Controller-side store of drawing sets keyed by a tag such as a symbol.
///
/// Bulk saves are filed under the currently selected tag and fed back to a
/// toolbox when that tag is loaded again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingStore {
    sets: BTreeMap<String, Value>,
    save_under: Option<String>,
}

impl DrawingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a previously exported map
    pub fn from_sets(sets: BTreeMap<String, Value>) -> Self {
        Self {
            sets,
            save_under: None,
        }
    }

    pub fn sets(&self) -> &BTreeMap<String, Value> {
        &self.sets
    }

    /// Select the tag incoming bulk saves are stored under
    pub fn save_under(&mut self, tag: impl Into<String>) {
        self.save_under = Some(tag.into());
    }

    pub fn current_tag(&self) -> Option<&str> {
        self.save_under.as_deref()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// Number of stored drawings under `tag`
    pub fn count(&self, tag: &str) -> usize {
        self.sets
            .get(tag)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn remove(&mut self, tag: &str) -> Option<Value> {
        self.sets.remove(tag)
    }

    /// File a bulk save under the selected tag; ignored when none is selected
    pub fn store(&mut self, drawings: Value) -> bool {
        let Some(tag) = &self.save_under else {
            debug!("No tag selected, dropping drawing save");
            return false;
        };
        self.sets.insert(tag.clone(), drawings);
        true
    }

    /// Handle one outbound toolbox message. Lifecycle events are returned
    /// for the caller to dispatch; bulk saves are stored.
    pub fn handle_message(&mut self, message: &str) -> PersistenceResult<ControllerMessage> {
        let parsed = ControllerMessage::parse(message)?;
        if let ControllerMessage::SaveDrawings { drawings, .. } = &parsed {
            self.store(drawings.clone());
        }
        Ok(parsed)
    }

    /// JSON payload to feed back into a toolbox, `None` when nothing is
    /// stored under `tag`
    pub fn payload_for(&self, tag: &str) -> Option<String> {
        let drawings = self.sets.get(tag)?;
        if drawings.as_array().is_some_and(Vec::is_empty) {
            return None;
        }
        serde_json::to_string(drawings).ok()
    }

    /// Replace the stored sets with the contents of `path`.
    /// Returns `Ok(false)` when the file does not exist.
    pub fn import(&mut self, path: impl AsRef<Path>) -> PersistenceResult<bool> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Drawing file {} does not exist", path.display());
            return Ok(false);
        }
        let reader = BufReader::new(File::open(path)?);
        self.sets = serde_json::from_reader(reader)?;
        info!("Imported {} drawing sets from {}", self.sets.len(), path.display());
        Ok(true)
    }

    /// Write every stored set to `path` as indented JSON
    pub fn export(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        self.sets.serialize(&mut serializer)?;
        writer.flush()?;
        info!("Exported {} drawing sets to {}", self.sets.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_save_message() {
        let message = ControllerMessage::parse(r#"save_drawingswindow.x_~_[{"type":"Box"}]"#).unwrap();
        assert_eq!(
            message,
            ControllerMessage::SaveDrawings {
                instance: "window.x".into(),
                drawings: json!([{"type": "Box"}]),
            }
        );
    }

    #[test]
    fn test_parse_lifecycle_message() {
        let message =
            ControllerMessage::parse(r#"measure_1_~_updated_~_[{"time":null,"logical":2,"price":3.0}]"#)
                .unwrap();
        assert_eq!(
            message,
            ControllerMessage::Lifecycle {
                callback: "measure_1".into(),
                kind: LifecycleKind::Updated,
                points: vec![Point::at(2, 3.0)],
            }
        );
    }

    #[test]
    fn test_malformed_messages() {
        assert!(matches!(
            ControllerMessage::parse("save_drawingswindow.x"),
            Err(PersistenceError::MalformedMessage(_))
        ));
        assert!(matches!(
            ControllerMessage::parse("measure_1_~_resized_~_[]"),
            Err(PersistenceError::MalformedMessage(_))
        ));
        assert!(matches!(
            ControllerMessage::parse("save_drawingsw_~_not json"),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn test_save_without_tag_is_dropped() {
        let mut store = DrawingStore::new();
        store.handle_message("save_drawingsw_~_[]").unwrap();
        assert!(store.sets().is_empty());

        store.save_under("AAPL");
        store.handle_message(r#"save_drawingsw_~_[{"type":"Box"}]"#).unwrap();
        assert_eq!(store.count("AAPL"), 1);
        assert_eq!(store.payload_for("AAPL").unwrap(), r#"[{"type":"Box"}]"#);
        assert_eq!(store.payload_for("MSFT"), None);
    }
}
