//! Black screen that hides the pad until the next input

use std::time::{Duration, Instant};

use eframe::egui;
use tracing::info;

use crate::constants::timing;

#[derive(Debug, Default)]
pub struct SleepOverlay {
    since: Option<Instant>,
}

impl SleepOverlay {
    pub fn sleep(&mut self, now: Instant) {
        info!("Entering sleep");
        self.since = Some(now);
    }

    pub fn is_active(&self) -> bool {
        self.since.is_some()
    }

    /// Taps within the grace period after sleeping (e.g. the one that pressed
    /// the sleep button) do not wake the screen
    pub fn should_wake(&self, now: Instant) -> bool {
        self.since.is_some_and(|since| {
            now.duration_since(since) >= Duration::from_millis(timing::SLEEP_WAKE_GRACE_MS)
        })
    }

    /// Draw the overlay and swallow this frame's input; returns true when
    /// a key, pointer or touch event woke the screen
    pub fn ui(&mut self, ctx: &egui::Context) -> bool {
        if !self.is_active() {
            return false;
        }

        let screen = ctx.content_rect();
        egui::Area::new(egui::Id::new("sleep_overlay"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                ui.painter().rect_filled(screen, 0.0, egui::Color32::BLACK);
                ui.allocate_rect(screen, egui::Sense::click_and_drag());
            });

        let input = ctx.input_mut(|i| {
            let seen = i.events.iter().any(is_wake_event);
            i.events.clear();
            seen
        });
        if input && self.should_wake(Instant::now()) {
            info!("Waking from sleep");
            self.since = None;
            return true;
        }
        false
    }
}

fn is_wake_event(event: &egui::Event) -> bool {
    matches!(
        event,
        egui::Event::Key { pressed: true, .. }
            | egui::Event::PointerMoved(_)
            | egui::Event::PointerButton { .. }
            | egui::Event::Touch { .. }
    )
}
