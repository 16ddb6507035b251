//! Key combo recording for keys/hotkey actions

use egui::{Key, Modifiers};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
    pub key: Option<String>,
}

impl KeyChord {
    pub fn from_egui(key: Key, modifiers: Modifiers) -> Self {
        Self {
            ctrl: modifiers.ctrl,
            shift: modifiers.shift,
            alt: modifiers.alt,
            // egui reports Super only as `mac_cmd`, and only on macOS; elsewhere
            // WIN comes from the editor's manual toggle
            win: modifiers.mac_cmd,
            key: Some(key.name().to_uppercase()),
        }
    }

    /// `CTRL+SHIFT+ALT+WIN+KEY`, modifiers in that fixed order
    pub fn to_combo(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.ctrl {
            parts.push("CTRL");
        }
        if self.shift {
            parts.push("SHIFT");
        }
        if self.alt {
            parts.push("ALT");
        }
        if self.win {
            parts.push("WIN");
        }
        if let Some(key) = &self.key {
            parts.push(key);
        }
        parts.join("+")
    }
}
