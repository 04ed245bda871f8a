use egui::{Key, Modifiers};
use log::debug;

use crate::host::{InstanceId, SharedContext};

/// A key press as seen by the hotkey predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            default_prevented: false,
        }
    }

    /// Keep the host from acting on the key as well
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Modifier and key combination of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    Alt(Key),
    /// Ctrl, or Cmd on macOS
    Command(Key),
    Plain(Key),
}

impl Chord {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let m = event.modifiers;
        match *self {
            Chord::Alt(key) => m.alt && event.key == key,
            Chord::Command(key) => (m.ctrl || m.mac_cmd || m.command) && event.key == key,
            Chord::Plain(key) => event.key == key,
        }
    }
}

/// What a matched hotkey asks its toolbox to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolboxCommand {
    /// Toggle the tool at this index of the tool bar
    SelectTool(usize),
    /// Remove the most recently added drawing
    UndoLast,
    /// Remove the hovered drawing, else the last hovered one
    DeleteHovered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub instance: InstanceId,
    pub chord: Chord,
    pub command: ToolboxCommand,
}

/// A binding that consumed a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyMatch {
    pub instance: InstanceId,
    pub command: ToolboxCommand,
}

/// Ordered hotkey predicates of every toolbox sharing one focus token.
///
/// A binding only fires while its toolbox instance holds focus.
#[derive(Debug, Clone)]
pub struct HotkeyRegistry {
    context: SharedContext,
    bindings: Vec<HotkeyBinding>,
}

impl HotkeyRegistry {
    pub fn new(context: SharedContext) -> Self {
        Self {
            context,
            bindings: Vec::new(),
        }
    }

    pub fn push(&mut self, binding: HotkeyBinding) {
        self.bindings.push(binding);
    }

    pub fn bindings(&self) -> &[HotkeyBinding] {
        &self.bindings
    }

    /// Drop every binding of one toolbox instance
    pub fn remove_instance(&mut self, instance: &InstanceId) {
        self.bindings.retain(|b| &b.instance != instance);
    }

    /// Run the predicates in registration order; the first match consumes
    /// the event.
    pub fn dispatch(&self, event: &mut KeyEvent) -> Option<HotkeyMatch> {
        let binding = self
            .bindings
            .iter()
            .find(|b| self.context.is_focused(&b.instance) && b.chord.matches(event))?;

        if matches!(binding.command, ToolboxCommand::SelectTool(_)) {
            event.prevent_default();
        }
        debug!("Hotkey {:?} -> {:?} on {}", binding.chord, binding.command, binding.instance);
        Some(HotkeyMatch {
            instance: binding.instance.clone(),
            command: binding.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alt() -> Modifiers {
        Modifiers {
            alt: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_chords() {
        assert!(Chord::Alt(Key::T).matches(&KeyEvent::new(Key::T, alt())));
        assert!(!Chord::Alt(Key::T).matches(&KeyEvent::new(Key::T, Modifiers::NONE)));
        assert!(Chord::Command(Key::Z).matches(&KeyEvent::new(Key::Z, Modifiers::CTRL)));
        assert!(Chord::Command(Key::Z).matches(&KeyEvent::new(Key::Z, Modifiers::MAC_CMD)));
        assert!(!Chord::Command(Key::Z).matches(&KeyEvent::new(Key::Y, Modifiers::CTRL)));
    }

    #[test]
    fn test_only_focused_instance_fires() {
        let context = SharedContext::new();
        let a = InstanceId::new("a");
        let b = InstanceId::new("b");
        let mut registry = HotkeyRegistry::new(context.clone());
        for instance in [&a, &b] {
            registry.push(HotkeyBinding {
                instance: instance.clone(),
                chord: Chord::Alt(Key::H),
                command: ToolboxCommand::SelectTool(1),
            });
        }

        let mut event = KeyEvent::new(Key::H, alt());
        assert_eq!(registry.dispatch(&mut event), None);
        assert!(!event.default_prevented());

        context.focus(&b);
        let hit = registry.dispatch(&mut event).unwrap();
        assert_eq!(hit.instance, b);
        assert!(event.default_prevented());
    }
}
