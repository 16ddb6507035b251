//! Auto-dismissing notifications

use std::time::{Duration, Instant};

use egui::{Align2, RichText};

use super::constants::{PADDING, TOAST_ERROR, TOAST_FILL};
use crate::constants::toast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    pub expires: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, text: impl Into<String>, kind: ToastKind, duration: Duration) {
        self.push_at(Instant::now(), text, kind, duration);
    }

    pub fn push_at(&mut self, now: Instant, text: impl Into<String>, kind: ToastKind, duration: Duration) {
        self.items.push(Toast {
            text: text.into(),
            kind,
            expires: now + duration,
        });
    }

    pub fn info(&mut self, text: impl Into<String>, ms: u64) {
        self.push(text, ToastKind::Info, Duration::from_millis(ms));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text, ToastKind::Error, Duration::from_millis(toast::ERROR_MS));
    }

    /// Drop expired notifications
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|toast| toast.expires > now);
    }

    pub fn visible(&self) -> &[Toast] {
        &self.items
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune(Instant::now());
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::CENTER_BOTTOM, [0.0, -3.0 * PADDING])
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.items {
                    egui::Frame::new()
                        .fill(TOAST_FILL)
                        .corner_radius(8.0)
                        .inner_margin(PADDING)
                        .show(ui, |ui| {
                            let text = RichText::new(&toast.text).size(16.0);
                            match toast.kind {
                                ToastKind::Info => ui.label(text),
                                ToastKind::Error => ui.label(text.color(TOAST_ERROR)),
                            };
                        });
                    ui.add_space(4.0);
                }
            });
    }
}
