//! Grid projection
//!
//! [`render`] turns a profile into a view model the GUI draws as-is: one cell
//! per button in array order, laid out row-major by the profile's column
//! count. [`RenderEngine`] keeps the last projection and only rebuilds when
//! the displayed content actually changed.

use egui::{Pos2, Rect, Vec2};
use serde::Serialize;
use tracing::trace;

use crate::config::profile::{Accent, Button, Profile};
use crate::controller::Mode;
use crate::sync::{Fingerprint, fingerprint};

/// Label keyword → icon name; first match wins
pub const ICON_RULES: &[(&str, &str)] = &[
    ("obs", "fa-video"),
    ("rec", "fa-circle-dot"),
    ("mic", "fa-microphone-slash"),
    ("scene", "fa-clapperboard"),
    ("steam", "fa-steam"),
    ("discord", "fa-discord"),
    ("play", "fa-play"),
    ("pause", "fa-pause"),
    ("next", "fa-forward-step"),
    ("prev", "fa-backward-step"),
    ("mute", "fa-volume-xmark"),
    ("copy", "fa-copy"),
    ("paste", "fa-paste"),
    ("undo", "fa-rotate-left"),
    ("lock", "fa-lock"),
    ("task", "fa-list-check"),
    ("term", "fa-terminal"),
    ("explor", "fa-folder-open"),
    ("snip", "fa-crop-simple"),
    ("enter", "fa-arrow-turn-down"),
];

pub const DEFAULT_ICON: &str = "fa-cube";

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub label: String,
    pub hint: String,
    pub accent: Accent,
    pub icon: String,
    pub image: Option<String>,
    pub draggable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub profile_id: String,
    pub cols: usize,
    pub cells: Vec<CellView>,
    /// Position of the "add button" slot (edit mode only)
    pub add_slot: Option<(usize, usize)>,
}

impl GridView {
    /// Cells plus the add slot
    pub fn slot_count(&self) -> usize {
        self.cells.len() + usize::from(self.add_slot.is_some())
    }

    pub fn rows(&self) -> usize {
        self.slot_count().div_ceil(self.cols)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorEntry {
    pub id: String,
    pub label: String,
}

/// Explicit icon, else the label keyword heuristic, else the default icon
pub fn resolve_icon(button: &Button) -> String {
    if let Some(icon) = button.icon_name() {
        return icon.to_string();
    }
    let label = button.label.to_lowercase();
    ICON_RULES
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map_or(DEFAULT_ICON, |(_, icon)| *icon)
        .to_string()
}

pub fn render(profile: &Profile, mode: Mode) -> GridView {
    let cols = profile.grid.columns();
    let draggable = mode == Mode::Reorganize;
    let cells = profile
        .buttons
        .iter()
        .enumerate()
        .map(|(index, button)| CellView {
            index,
            row: index / cols,
            col: index % cols,
            label: button.label.clone(),
            hint: button.hint.clone(),
            accent: button.accent.clone(),
            icon: resolve_icon(button),
            image: button.image_uri().map(str::to_string),
            draggable,
        })
        .collect::<Vec<_>>();

    let add_slot = (mode == Mode::Edit).then(|| (cells.len() / cols, cells.len() % cols));

    GridView {
        profile_id: profile.id.clone(),
        cols,
        cells,
        add_slot,
    }
}

pub fn render_selector(profiles: &[Profile]) -> Vec<SelectorEntry> {
    profiles
        .iter()
        .map(|profile| SelectorEntry {
            id: profile.id.clone(),
            label: profile.display_label().to_string(),
        })
        .collect()
}

/// Caches the displayed grid and selector, rebuilding only on content change
#[derive(Debug, Default)]
pub struct RenderEngine {
    grid: Option<GridView>,
    grid_key: Option<Fingerprint>,
    selector: Vec<SelectorEntry>,
    selector_key: Option<Fingerprint>,
    grid_renders: u64,
    selector_renders: u64,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the grid if `profile`/`mode` differ from what is displayed
    pub fn refresh_grid(&mut self, profile: Option<&Profile>, mode: Mode) -> bool {
        let key = fingerprint(&(profile, mode));
        if self.grid_key == Some(key) {
            return false;
        }
        self.grid = profile.map(|profile| render(profile, mode));
        self.grid_key = Some(key);
        self.grid_renders += 1;
        trace!(
            profile = profile.map_or("<none>", |p| p.id.as_str()),
            renders = self.grid_renders,
            "Grid rebuilt"
        );
        true
    }

    /// Rebuild the selector if profile ids/labels/order changed
    pub fn refresh_selector(&mut self, profiles: &[Profile]) -> bool {
        let entries = render_selector(profiles);
        let key = fingerprint(&entries);
        if self.selector_key == Some(key) {
            return false;
        }
        self.selector = entries;
        self.selector_key = Some(key);
        self.selector_renders += 1;
        true
    }

    pub fn grid(&self) -> Option<&GridView> {
        self.grid.as_ref()
    }

    pub fn selector(&self) -> &[SelectorEntry] {
        &self.selector
    }

    pub fn grid_renders(&self) -> u64 {
        self.grid_renders
    }

    pub fn selector_renders(&self) -> u64 {
        self.selector_renders
    }

    pub fn renders(&self) -> u64 {
        self.grid_renders + self.selector_renders
    }
}

/// Screen-space layout of a grid, used for drawing and touch hit-testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub origin: Pos2,
    pub cell: Vec2,
    pub gap: f32,
    pub cols: usize,
    pub count: usize,
}

impl GridGeometry {
    /// Fit `cols` columns into `width`, square cells
    pub fn fit(origin: Pos2, width: f32, gap: f32, cols: usize, count: usize) -> Self {
        let cols = cols.max(1);
        let side = ((width - gap * (cols as f32 - 1.0)) / cols as f32).max(1.0);
        Self {
            origin,
            cell: Vec2::splat(side),
            gap,
            cols,
            count,
        }
    }

    pub fn rows(&self) -> usize {
        self.count.div_ceil(self.cols)
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        let row = index / self.cols;
        let col = index % self.cols;
        let min = self.origin
            + Vec2::new(
                col as f32 * (self.cell.x + self.gap),
                row as f32 * (self.cell.y + self.gap),
            );
        Rect::from_min_size(min, self.cell)
    }

    pub fn total_size(&self) -> Vec2 {
        let rows = self.rows() as f32;
        let cols = self.cols as f32;
        Vec2::new(
            cols * self.cell.x + (cols - 1.0).max(0.0) * self.gap,
            rows * self.cell.y + (rows - 1.0).max(0.0) * self.gap,
        )
    }

    /// Cell under `point`; gaps and positions past the last cell hit nothing
    pub fn index_at(&self, point: Pos2) -> Option<usize> {
        let rel = point - self.origin;
        if rel.x < 0.0 || rel.y < 0.0 {
            return None;
        }
        let pitch = self.cell + Vec2::splat(self.gap);
        let col = (rel.x / pitch.x) as usize;
        let row = (rel.y / pitch.y) as usize;
        if col >= self.cols {
            return None;
        }
        if rel.x - col as f32 * pitch.x > self.cell.x || rel.y - row as f32 * pitch.y > self.cell.y {
            return None;
        }
        let index = row * self.cols + col;
        (index < self.count).then_some(index)
    }
}
