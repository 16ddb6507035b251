//! GUI-specific constants for layout, colors and intervals

use egui::Color32;

use crate::config::profile::Accent;

/// Minimum window size
pub const WINDOW_MIN_WIDTH: f32 = 480.0;
pub const WINDOW_MIN_HEIGHT: f32 = 320.0;

/// Layout spacing
pub const PADDING: f32 = 10.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;
pub const GRID_GAP: f32 = 12.0;
pub const CELL_ROUNDING: f32 = 10.0;
pub const CELL_BORDER: f32 = 2.0;
pub const ICON_SIZE: f32 = 30.0;
pub const EDITOR_WIDTH: f32 = 380.0;
pub const EDITOR_PREVIEW_SIZE: f32 = 96.0;

/// Connection indicator colors
pub const STATUS_ONLINE: Color32 = Color32::from_rgb(0, 200, 0);
pub const STATUS_OFFLINE: Color32 = Color32::from_rgb(200, 0, 0);
pub const STATUS_CONNECTING: Color32 = Color32::from_rgb(200, 200, 0);

/// Surfaces
pub const CELL_FILL: Color32 = Color32::from_rgb(24, 28, 36);
pub const CELL_FILL_HOVER: Color32 = Color32::from_rgb(34, 40, 52);
pub const DROP_TARGET: Color32 = Color32::from_rgb(250, 250, 250);
pub const HINT_TEXT: Color32 = Color32::from_rgb(140, 150, 165);
pub const TOAST_FILL: Color32 = Color32::from_rgba_premultiplied(16, 18, 24, 235);
pub const TOAST_ERROR: Color32 = Color32::from_rgb(230, 80, 80);

/// UI refresh cadence while idle (drives the watchdog and toast expiry)
pub const REPAINT_INTERVAL_MS: u64 = 250;

pub fn accent_color(accent: &Accent) -> Color32 {
    match accent {
        Accent::Cyan | Accent::Other(_) => Color32::from_rgb(34, 211, 238),
        Accent::Purple => Color32::from_rgb(168, 85, 247),
        Accent::Green => Color32::from_rgb(74, 222, 128),
        Accent::Amber => Color32::from_rgb(251, 191, 36),
        Accent::Red => Color32::from_rgb(248, 113, 113),
        Accent::Slate => Color32::from_rgb(148, 163, 184),
    }
}
