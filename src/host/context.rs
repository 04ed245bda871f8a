use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Handler identifier of one toolbox instance (one chart pane)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cursor requested for the whole chart view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
    Grabbing,
    Crosshair,
}

impl CursorStyle {
    pub fn to_cursor_icon(self) -> egui::CursorIcon {
        match self {
            Self::Default => egui::CursorIcon::Default,
            Self::Pointer => egui::CursorIcon::PointingHand,
            Self::Grabbing => egui::CursorIcon::Grabbing,
            Self::Crosshair => egui::CursorIcon::Crosshair,
        }
    }
}

#[derive(Debug, Default)]
struct ContextState {
    focused: Option<InstanceId>,
    cursor: CursorStyle,
}

/// State shared by every toolbox and drawing of one window.
///
/// Cloning yields another handle onto the same state.
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    inner: Arc<Mutex<ContextState>>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self, instance: &InstanceId) {
        self.inner.lock().focused = Some(instance.clone());
    }

    pub fn clear_focus(&self) {
        self.inner.lock().focused = None;
    }

    pub fn focused(&self) -> Option<InstanceId> {
        self.inner.lock().focused.clone()
    }

    pub fn is_focused(&self, instance: &InstanceId) -> bool {
        self.inner.lock().focused.as_ref() == Some(instance)
    }

    pub fn set_cursor(&self, cursor: CursorStyle) {
        self.inner.lock().cursor = cursor;
    }

    pub fn cursor(&self) -> CursorStyle {
        self.inner.lock().cursor
    }
}
