use eframe::egui;

use crate::constants::layout;
use crate::gui::constants::*;
use crate::render::SelectorEntry;

pub enum ProfileAction {
    None,
    Switch(String),
    Create { label: String, cols: u32 },
}

pub struct ProfileSelector {
    new_label: String,
    new_cols: u32,
    show_new_dialog: bool,
}

impl ProfileSelector {
    pub fn new() -> Self {
        Self {
            new_label: String::new(),
            new_cols: layout::DEFAULT_GRID_COLS,
            show_new_dialog: false,
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        entries: &[SelectorEntry],
        current: Option<&str>,
        editing: bool,
    ) -> ProfileAction {
        let mut action = ProfileAction::None;

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Profile:").strong());

            let mut selected = current.map(str::to_string);
            let selected_text = entries
                .iter()
                .find(|entry| Some(entry.id.as_str()) == current)
                .map_or("(none)", |entry| entry.label.as_str());

            egui::ComboBox::from_id_salt("profile_selector")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for entry in entries {
                        if ui
                            .selectable_value(&mut selected, Some(entry.id.clone()), &entry.label)
                            .clicked()
                        {
                            action = ProfileAction::Switch(entry.id.clone());
                        }
                    }
                });

            // Large touch targets for quick switching when there are few profiles
            if entries.len() > 1 && entries.len() <= 6 {
                ui.add_space(ITEM_SPACING);
                for entry in entries {
                    let active = Some(entry.id.as_str()) == current;
                    if ui.selectable_label(active, &entry.label).clicked() && !active {
                        action = ProfileAction::Switch(entry.id.clone());
                    }
                }
            }

            if editing {
                ui.add_space(ITEM_SPACING);
                if ui.button("\u{2795} New profile").clicked() {
                    self.show_new_dialog = true;
                    self.new_label.clear();
                    self.new_cols = layout::DEFAULT_GRID_COLS;
                }
            }
        });

        if self.show_new_dialog {
            if let Some(created) = self.new_profile_dialog(ui.ctx()) {
                action = created;
            }
        }

        action
    }

    fn new_profile_dialog(&mut self, ctx: &egui::Context) -> Option<ProfileAction> {
        let mut action = None;

        egui::Window::new("New Profile")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Profile Name:");
                ui.text_edit_singleline(&mut self.new_label);

                ui.add_space(ITEM_SPACING);
                ui.horizontal(|ui| {
                    ui.label("Columns:");
                    ui.add(egui::Slider::new(&mut self.new_cols, 1..=8));
                });

                ui.add_space(ITEM_SPACING);
                ui.horizontal(|ui| {
                    if ui.button("Create").clicked() && !self.new_label.trim().is_empty() {
                        action = Some(ProfileAction::Create {
                            label: self.new_label.trim().to_string(),
                            cols: self.new_cols,
                        });
                        self.show_new_dialog = false;
                    }

                    if ui.button("Cancel").clicked() {
                        self.show_new_dialog = false;
                    }
                });
            });

        action
    }
}
