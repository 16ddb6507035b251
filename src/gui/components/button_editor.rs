use std::path::{Path, PathBuf};

use eframe::egui;
use tracing::{debug, warn};

use crate::config::profile::{Accent, ActionKind, Button};
use crate::controller::{EditingSession, KeyChord};
use crate::gui::constants::*;
use crate::gui::images::ImageCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Save,
    Delete,
    Cancel,
    ImageFailed(String),
}

/// Form state that lives outside the editing session
#[derive(Default)]
pub struct ButtonEditor {
    image_path: String,
}

impl ButtonEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui(
        &mut self,
        ctx: &egui::Context,
        session: &mut EditingSession,
        original: &Button,
        images: &mut ImageCache,
    ) -> EditorAction {
        let mut action = EditorAction::None;

        if session.recording {
            record_chord(ctx, session);
        }
        if let Some(path) = dropped_file(ctx) {
            action = load_image(session, &path);
        }

        let mut open = true;
        egui::Window::new(format!("Edit button #{}", session.button_index + 1))
            .collapsible(false)
            .resizable(false)
            .default_width(EDITOR_WIDTH)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                let draft = &mut session.draft;
                let mut toggle_recording = false;

                egui::Grid::new("button_editor_fields")
                    .num_columns(2)
                    .spacing([ITEM_SPACING, ITEM_SPACING])
                    .show(ui, |ui| {
                        ui.label("Label:");
                        ui.text_edit_singleline(&mut draft.label);
                        ui.end_row();

                        ui.label("Hint:");
                        ui.text_edit_singleline(&mut draft.hint);
                        ui.end_row();

                        ui.label("Accent:");
                        egui::ComboBox::from_id_salt("editor_accent")
                            .selected_text(draft.accent.as_str())
                            .show_ui(ui, |ui| {
                                for accent in Accent::ALL {
                                    let label = accent.as_str().to_string();
                                    ui.selectable_value(&mut draft.accent, accent, label);
                                }
                            });
                        ui.end_row();

                        ui.label("Icon:");
                        ui.add(
                            egui::TextEdit::singleline(&mut draft.icon)
                                .hint_text("fa-... (empty = automatic)"),
                        );
                        ui.end_row();

                        ui.label("Action:");
                        egui::ComboBox::from_id_salt("editor_action_kind")
                            .selected_text(draft.kind.as_str())
                            .show_ui(ui, |ui| {
                                for kind in ActionKind::ALL {
                                    let label = kind.as_str().to_string();
                                    ui.selectable_value(&mut draft.kind, kind, label);
                                }
                            });
                        ui.end_row();

                        ui.label("Payload:");
                        ui.horizontal(|ui| {
                            ui.add_enabled(
                                !session.recording && draft.kind != ActionKind::Noop,
                                egui::TextEdit::singleline(&mut draft.payload)
                                    .hint_text(payload_hint(&draft.kind)),
                            );
                            if draft.kind.takes_key_combo() {
                                let label = if session.recording { "\u{23F9} Stop" } else { "\u{23FA} REC" };
                                if ui.selectable_label(session.recording, label).clicked() {
                                    toggle_recording = true;
                                }
                                ui.toggle_value(&mut session.hold_win, "WIN")
                                    .on_hover_text("Add the Windows key to recorded combos");
                            }
                        });
                        ui.end_row();
                    });

                if toggle_recording {
                    session.toggle_recording();
                    debug!(recording = session.recording, "Key recording toggled");
                }
                if !session.draft.kind.takes_key_combo() {
                    session.recording = false;
                }

                ui.add_space(SECTION_SPACING);
                ui.group(|ui| {
                    ui.label(egui::RichText::new("Image").strong());
                    ui.horizontal(|ui| {
                        match session
                            .preview_image(original)
                            .and_then(|uri| images.texture(ctx, uri))
                        {
                            Some(texture) => {
                                ui.add(
                                    egui::Image::from_texture(egui::load::SizedTexture::from_handle(&texture))
                                        .fit_to_exact_size(egui::Vec2::splat(EDITOR_PREVIEW_SIZE)),
                                );
                            }
                            None => {
                                ui.label(egui::RichText::new("(icon)").color(HINT_TEXT));
                            }
                        }

                        ui.vertical(|ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut self.image_path)
                                    .hint_text("/path/to/image.png or drop a file"),
                            );
                            ui.horizontal(|ui| {
                                if ui.button("Load").clicked() && !self.image_path.trim().is_empty() {
                                    let path = PathBuf::from(self.image_path.trim());
                                    action = load_image(session, &path);
                                }
                                if ui.button("Clear image").clicked() {
                                    session.clear_image();
                                }
                            });
                        });
                    });
                });

                ui.add_space(SECTION_SPACING);
                ui.horizontal(|ui| {
                    if ui.button("\u{1F4BE} Save").clicked() {
                        action = EditorAction::Save;
                    }
                    if ui.button("\u{1F5D1} Delete").clicked() {
                        action = EditorAction::Delete;
                    }
                    if ui.button("Cancel").clicked() {
                        action = EditorAction::Cancel;
                    }
                });
            });

        if !open {
            action = EditorAction::Cancel;
        }
        if matches!(action, EditorAction::Save | EditorAction::Delete | EditorAction::Cancel) {
            self.image_path.clear();
        }
        action
    }
}

fn payload_hint(kind: &ActionKind) -> &'static str {
    match kind {
        ActionKind::Keys | ActionKind::Hotkey => "CTRL+SHIFT+M",
        ActionKind::Run => "C:\\path\\to\\app.exe",
        ActionKind::Shell => "command line",
        ActionKind::Noop | ActionKind::Other(_) => "",
    }
}

/// Replace the payload with the last key chord pressed this frame
fn record_chord(ctx: &egui::Context, session: &mut EditingSession) {
    let chord = ctx.input(|i| {
        i.events.iter().rev().find_map(|event| match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => Some(KeyChord::from_egui(*key, *modifiers)),
            _ => None,
        })
    });
    if let Some(chord) = chord {
        session.record(chord);
    }
}

fn dropped_file(ctx: &egui::Context) -> Option<PathBuf> {
    ctx.input(|i| i.raw.dropped_files.iter().find_map(|file| file.path.clone()))
}

fn load_image(session: &mut EditingSession, path: &Path) -> EditorAction {
    match session.set_image_from_file(path) {
        Ok(()) => EditorAction::None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to load button image");
            EditorAction::ImageFailed(format!("{err:#}"))
        }
    }
}
