//! Button grid: cells, the add slot, and both reorder gestures
//!
//! Mouse drags use egui's drag-and-drop payload, so the drop target is the
//! cell that receives the payload. Touch drags are tracked by screen
//! position and resolved against the [`GridGeometry`] by the controller.

use eframe::egui;
use egui::{Align2, FontId, Pos2, Rect, Sense, Stroke, StrokeKind};

use crate::controller::{DragState, DragVia};
use crate::gui::constants::*;
use crate::gui::icons;
use crate::gui::images::ImageCache;
use crate::render::{CellView, GridGeometry, GridView};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridAction {
    Tap(usize),
    Add,
    DragStart(usize),
    Hover(Option<usize>),
    Drop(usize),
    /// Pointer drag released without landing on a cell
    DragEnd,
    TouchStart(Pos2),
    TouchMove(Pos2),
    TouchEnd(Pos2),
}

pub struct GridOutput {
    pub geometry: GridGeometry,
    pub actions: Vec<GridAction>,
}

pub fn ui(
    ui: &mut egui::Ui,
    view: &GridView,
    drag: Option<&DragState>,
    images: &mut ImageCache,
) -> GridOutput {
    let available = ui.available_rect_before_wrap();
    let geometry = GridGeometry::fit(
        available.min,
        available.width(),
        GRID_GAP,
        view.cols,
        view.slot_count(),
    );
    ui.allocate_rect(
        Rect::from_min_size(available.min, geometry.total_size()),
        Sense::hover(),
    );

    let touching = ui.ctx().input(|i| i.any_touches());
    let mut actions = Vec::new();
    let mut released = false;

    for cell in &view.cells {
        let rect = geometry.cell_rect(cell.index);
        let sense = if cell.draggable {
            Sense::click_and_drag()
        } else {
            Sense::click()
        };
        let response = ui.interact(rect, ui.id().with(("cell", cell.index)), sense);

        if cell.draggable {
            handle_drag(ui, &response, cell.index, touching, drag, &geometry, &mut actions, &mut released);
        }
        if response.clicked() {
            actions.push(GridAction::Tap(cell.index));
        }

        let highlight = match drag {
            Some(state) if state.from == cell.index => CellHighlight::Source,
            Some(state) if state.hover == Some(cell.index) => CellHighlight::DropTarget,
            _ if response.hovered() => CellHighlight::Hovered,
            _ => CellHighlight::None,
        };
        let texture = cell.image.as_deref().and_then(|uri| images.texture(ui.ctx(), uri));
        paint_cell(ui, rect, cell, texture.as_ref(), highlight);
    }

    if view.add_slot.is_some() {
        let index = view.cells.len();
        let rect = geometry.cell_rect(index);
        let response = ui.interact(rect, ui.id().with("add_slot"), Sense::click());
        paint_add_slot(ui, rect, response.hovered());
        if response.clicked() {
            actions.push(GridAction::Add);
        }
    }

    // A released pointer drag that no cell accepted
    if released && !actions.iter().any(|a| matches!(a, GridAction::Drop(_))) {
        actions.push(GridAction::DragEnd);
    }

    GridOutput { geometry, actions }
}

#[allow(clippy::too_many_arguments)]
fn handle_drag(
    ui: &egui::Ui,
    response: &egui::Response,
    index: usize,
    touching: bool,
    drag: Option<&DragState>,
    geometry: &GridGeometry,
    actions: &mut Vec<GridAction>,
    released: &mut bool,
) {
    let via = drag.map(|state| state.via);
    let pointer = ui.ctx().input(|i| i.pointer.interact_pos());

    if response.drag_started() {
        if touching {
            if let Some(pos) = pointer {
                actions.push(GridAction::TouchStart(pos));
            }
        } else {
            actions.push(GridAction::DragStart(index));
        }
    }

    match via {
        Some(DragVia::Touch) => {
            if let Some(pos) = pointer {
                if response.dragged() {
                    actions.push(GridAction::TouchMove(pos));
                }
                if response.drag_stopped() {
                    actions.push(GridAction::TouchEnd(pos));
                }
            }
        }
        Some(DragVia::Pointer) | None => {
            if !touching {
                response.dnd_set_drag_payload(index);
            }
            if response.dragged() && via.is_some() {
                let hover = pointer.and_then(|pos| geometry.index_at(pos));
                actions.push(GridAction::Hover(hover));
            }
            if response.drag_stopped() && via.is_some() {
                *released = true;
            }
        }
    }

    if response.dnd_release_payload::<usize>().is_some() {
        actions.push(GridAction::Drop(index));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellHighlight {
    None,
    Hovered,
    Source,
    DropTarget,
}

fn paint_cell(
    ui: &egui::Ui,
    rect: Rect,
    cell: &CellView,
    texture: Option<&egui::TextureHandle>,
    highlight: CellHighlight,
) {
    let painter = ui.painter();
    let accent = accent_color(&cell.accent);

    let fill = match highlight {
        CellHighlight::Hovered | CellHighlight::DropTarget => CELL_FILL_HOVER,
        _ => CELL_FILL,
    };
    let stroke = match highlight {
        CellHighlight::DropTarget => Stroke::new(CELL_BORDER * 2.0, DROP_TARGET),
        _ => Stroke::new(CELL_BORDER, accent),
    };
    let rect_drawn = if highlight == CellHighlight::Source {
        rect.shrink(CELL_BORDER * 2.0)
    } else {
        rect
    };
    painter.rect(rect_drawn, CELL_ROUNDING, fill, stroke, StrokeKind::Inside);

    let visual_center = Pos2::new(rect.center().x, rect.top() + rect.height() * 0.42);
    match texture {
        Some(texture) => {
            let side = rect.width().min(rect.height()) * 0.55;
            let image_rect = Rect::from_center_size(visual_center, egui::Vec2::splat(side));
            egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                .corner_radius(CELL_ROUNDING / 2.0)
                .paint_at(ui, image_rect);
        }
        None => {
            painter.text(
                visual_center,
                Align2::CENTER_CENTER,
                icons::glyph(&cell.icon),
                FontId::proportional(ICON_SIZE),
                accent,
            );
        }
    }

    let text_color = ui.visuals().strong_text_color();
    painter.text(
        Pos2::new(rect.center().x, rect.bottom() - rect.height() * 0.2),
        Align2::CENTER_CENTER,
        &cell.label,
        FontId::proportional(15.0),
        text_color,
    );
    if !cell.hint.is_empty() {
        painter.text(
            Pos2::new(rect.center().x, rect.bottom() - rect.height() * 0.08),
            Align2::CENTER_CENTER,
            &cell.hint,
            FontId::proportional(11.0),
            HINT_TEXT,
        );
    }
}

fn paint_add_slot(ui: &egui::Ui, rect: Rect, hovered: bool) {
    let painter = ui.painter();
    let fill = if hovered { CELL_FILL_HOVER } else { CELL_FILL };
    painter.rect(
        rect,
        CELL_ROUNDING,
        fill,
        Stroke::new(CELL_BORDER, HINT_TEXT),
        StrokeKind::Inside,
    );
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        "\u{2795}",
        FontId::proportional(ICON_SIZE),
        HINT_TEXT,
    );
}
