use eframe::egui::{self, PointerButton, Rect, Response, Ui};

use super::GraphView;
use super::scene::SceneDescription;

impl GraphView {
    /// Wheel zoom about the pointer, drag-to-pan, node dragging and click selection.
    pub(super) fn handle_canvas_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &Response,
        scene: &SceneDescription,
        now: f64,
    ) {
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer));
        self.hovered = match self.dragging {
            Some(index) => Some(index),
            None => pointer.and_then(|pointer| scene.node_at(pointer - rect.min)),
        };

        self.handle_canvas_zoom(ui, rect, response);

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui.input(|input| input.pointer.press_origin());
            if let Some(index) = origin.and_then(|origin| scene.node_at(origin - rect.min)) {
                self.drag_start(index);
            }
        }

        if self.is_dragging() {
            if let Some(pointer) = response.interact_pointer_pos() {
                self.drag_move(pointer - rect.min);
            }
            if response.drag_stopped() || !response.dragged() {
                self.drag_end();
            }
        } else if response.dragged_by(PointerButton::Primary)
            || response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.viewport.pan_by(response.drag_delta());
        }

        if response.clicked_by(PointerButton::Primary) {
            match self.hovered {
                Some(index) => self.select_node(index, now),
                None => self.clear_selection(),
            }
        }

        if self.is_dragging() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
        } else if self.hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
    }

    fn handle_canvas_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.viewport.zoom_at(zoom_factor, pointer - rect.min);
    }
}
