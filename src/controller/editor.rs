//! Button editing session
//!
//! At most one session exists at a time. It addresses the button by
//! profile id and index, holds a draft of the form fields and the pending
//! image change; nothing touches the store until the session is saved.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

use crate::config::profile::{Accent, Action, ActionKind, Button};
use crate::controller::keys::KeyChord;

/// What saving does to the button's image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageEdit {
    #[default]
    Keep,
    Replace(String),
    Clear,
}

/// Editable copy of the form fields
#[derive(Debug, Clone, PartialEq)]
pub struct EditorDraft {
    pub label: String,
    pub hint: String,
    pub accent: Accent,
    pub icon: String,
    pub kind: ActionKind,
    pub payload: String,
}

impl EditorDraft {
    pub fn from_button(button: &Button) -> Self {
        Self {
            label: button.label.clone(),
            hint: button.hint.clone(),
            accent: button.accent.clone(),
            icon: button.icon.clone().unwrap_or_default(),
            kind: button.action.kind.clone(),
            payload: button.action.payload.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditingSession {
    pub profile_id: String,
    pub button_index: usize,
    pub pending_image: ImageEdit,
    pub draft: EditorDraft,
    /// Keyboard input is captured into the payload while set
    pub recording: bool,
    /// Adds WIN to recorded chords
    pub hold_win: bool,
}

impl EditingSession {
    pub fn new(profile_id: impl Into<String>, button_index: usize, button: &Button) -> Self {
        Self {
            profile_id: profile_id.into(),
            button_index,
            pending_image: ImageEdit::Keep,
            draft: EditorDraft::from_button(button),
            recording: false,
            hold_win: false,
        }
    }

    /// Apply the draft on top of `original`, keeping fields the editor does not know
    pub fn build_button(&self, original: &Button) -> Button {
        let icon = self.draft.icon.trim();
        let image = match &self.pending_image {
            ImageEdit::Keep => original.image.clone(),
            ImageEdit::Replace(uri) => Some(uri.clone()),
            ImageEdit::Clear => None,
        };
        Button {
            label: self.draft.label.trim().to_string(),
            hint: self.draft.hint.trim().to_string(),
            accent: self.draft.accent.clone(),
            icon: (!icon.is_empty()).then(|| icon.to_string()),
            image,
            action: Action::new(self.draft.kind.clone(), self.draft.payload.trim()),
            extra: original.extra.clone(),
        }
    }

    /// Image shown in the editor preview
    pub fn preview_image<'a>(&'a self, original: &'a Button) -> Option<&'a str> {
        match &self.pending_image {
            ImageEdit::Keep => original.image_uri(),
            ImageEdit::Replace(uri) => Some(uri.as_str()),
            ImageEdit::Clear => None,
        }
    }

    pub fn set_image_from_file(&mut self, path: &Path) -> Result<()> {
        let Some(mime) = mime_for_path(path) else {
            bail!("Unsupported image type: {}", path.display());
        };
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        self.pending_image = ImageEdit::Replace(image_data_uri(&bytes, mime));
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.pending_image = ImageEdit::Clear;
    }

    pub fn toggle_recording(&mut self) {
        self.recording = !self.recording;
    }

    pub fn record(&mut self, chord: KeyChord) {
        let chord = KeyChord {
            win: chord.win || self.hold_win,
            ..chord
        };
        self.draft.payload = chord.to_combo();
    }
}

pub fn image_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Image types the pad can decode for display
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original() -> Button {
        let mut button = Button::new("Mic", Action::new(ActionKind::Hotkey, "CTRL+M"));
        button.image = Some("data:image/png;base64,AAAA".to_string());
        button.extra.insert("pinned".into(), serde_json::json!(true));
        button
    }

    #[test]
    fn test_build_keeps_image_and_unknown_fields() {
        let button = original();
        let mut session = EditingSession::new("A", 0, &button);
        session.draft.label = "  Mute mic ".to_string();
        session.draft.icon = " ".to_string();

        let built = session.build_button(&button);
        assert_eq!(built.label, "Mute mic");
        assert_eq!(built.icon, None);
        assert_eq!(built.image, button.image);
        assert_eq!(built.extra, button.extra);
    }

    #[test]
    fn test_image_replace_and_clear() {
        let button = original();
        let mut session = EditingSession::new("A", 0, &button);

        session.pending_image = ImageEdit::Replace("data:image/png;base64,BBBB".into());
        assert_eq!(session.preview_image(&button), Some("data:image/png;base64,BBBB"));
        assert_eq!(
            session.build_button(&button).image.as_deref(),
            Some("data:image/png;base64,BBBB")
        );

        session.clear_image();
        assert_eq!(session.preview_image(&button), None);
        assert_eq!(session.build_button(&button).image, None);
    }

    #[test]
    fn test_image_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.PNG");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let button = original();
        let mut session = EditingSession::new("A", 0, &button);
        session.set_image_from_file(&path).unwrap();
        assert_eq!(
            session.pending_image,
            ImageEdit::Replace("data:image/png;base64,AQID".to_string())
        );

        assert!(session.set_image_from_file(&dir.path().join("notes.txt")).is_err());
    }

    #[test]
    fn test_manual_win_joins_recorded_chord() {
        let button = original();
        let mut session = EditingSession::new("A", 0, &button);
        session.record(KeyChord::from_egui(egui::Key::D, egui::Modifiers::CTRL));
        assert_eq!(session.draft.payload, "CTRL+D");

        session.hold_win = true;
        session.record(KeyChord::from_egui(egui::Key::D, egui::Modifiers::CTRL));
        assert_eq!(session.draft.payload, "CTRL+WIN+D");
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(mime_for_path(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("b.WebP")), Some("image/webp"));
        assert_eq!(mime_for_path(Path::new("c.svg")), None);
        assert_eq!(mime_for_path(Path::new("a")), None);
    }
}
