use eframe::egui;

use crate::connection::LinkState;
use crate::controller::Mode;
use crate::gui::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    None,
    ToggleMode(Mode),
    Sleep,
    Reconnect,
}

/// Everything the status bar displays
pub struct StatusView<'a> {
    pub link: LinkState,
    pub relay_online: bool,
    pub hosts: &'a [String],
    pub target: &'a str,
    pub mode: Mode,
}

/// Indicator color and text for the connection/liveness state
pub fn indicator(link: LinkState, relay_online: bool) -> (egui::Color32, String) {
    match link {
        LinkState::Open if relay_online => (STATUS_ONLINE, "\u{25CF}  Online".to_string()),
        LinkState::Open => (STATUS_CONNECTING, "\u{25CF}  Connected, waiting for status".to_string()),
        LinkState::Connecting => (STATUS_CONNECTING, "\u{25CF}  Connecting...".to_string()),
        LinkState::Retrying(delay) => (
            STATUS_OFFLINE,
            format!("\u{25CF}  Offline (retry in {:.1}s)", delay.as_secs_f32()),
        ),
        LinkState::Idle => (STATUS_OFFLINE, "\u{25CF}  Offline".to_string()),
    }
}

pub fn ui(ui: &mut egui::Ui, view: &StatusView<'_>) -> StatusAction {
    let mut action = StatusAction::None;

    ui.horizontal(|ui| {
        let (color, text) = indicator(view.link, view.relay_online);
        ui.colored_label(color, text);

        ui.separator();
        let hosts = if view.hosts.is_empty() {
            "no hosts".to_string()
        } else {
            view.hosts.join(", ")
        };
        ui.label(egui::RichText::new(hosts).color(HINT_TEXT));
        ui.label(format!("\u{2192} {}", view.target));

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("\u{1F319} Sleep").clicked() {
                action = StatusAction::Sleep;
            }
            if !matches!(view.link, LinkState::Open | LinkState::Connecting)
                && ui.button("\u{1F504} Reconnect").clicked()
            {
                action = StatusAction::Reconnect;
            }

            ui.add_space(ITEM_SPACING);
            for mode in [Mode::Reorganize, Mode::Edit] {
                if ui
                    .selectable_label(view.mode == mode, mode.label())
                    .clicked()
                {
                    action = StatusAction::ToggleMode(mode);
                }
            }
        });
    });

    action
}
