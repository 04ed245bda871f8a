//! Tool dispatcher: the registered drawing tools, their hotkeys and the
//! per-pane [`Toolbox`] that turns selections into creation sessions.

mod hotkeys;
mod toolbox;

pub use hotkeys::{Chord, HotkeyBinding, HotkeyMatch, HotkeyRegistry, KeyEvent, ToolboxCommand};
pub use toolbox::Toolbox;

use egui::Key;

use crate::drawing::DrawingKind;

/// One selectable tool; immutable once registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolEntry {
    pub icon: &'static str,
    pub label: &'static str,
    /// Selected with `Alt` + this key
    pub hotkey: Key,
    pub kind: DrawingKind,
}

impl ToolEntry {
    pub const fn new(icon: &'static str, label: &'static str, hotkey: Key, kind: DrawingKind) -> Self {
        Self {
            icon,
            label,
            hotkey,
            kind,
        }
    }
}

/// The standard tool bar, in display order
pub fn default_tools() -> Vec<ToolEntry> {
    vec![
        ToolEntry::new("╱", "Trend line", Key::T, DrawingKind::TrendLine),
        ToolEntry::new("━", "Horizontal line", Key::H, DrawingKind::HorizontalLine),
        ToolEntry::new("→", "Ray", Key::R, DrawingKind::RayLine),
        ToolEntry::new("▭", "Box", Key::B, DrawingKind::Box),
        ToolEntry::new("┃", "Vertical line", Key::V, DrawingKind::VerticalLine),
        ToolEntry::new("↔", "Measure", Key::M, DrawingKind::Measure),
    ]
}
