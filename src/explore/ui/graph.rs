use eframe::egui::{self, Sense, Ui};

use super::super::ViewModel;
use super::super::backend::ViewportSlot;

impl ViewModel {
    pub(in crate::explore) fn draw_graph(&mut self, ui: &mut Ui, slot: &mut ViewportSlot) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let now = ui.input(|input| input.time);

        self.session.set_viewport(rect);
        if !self.fitted {
            self.session.reset_camera(now);
            self.fitted = true;
        }

        self.handle_graph_zoom(ui, rect, &response, now);
        if response.dragged() {
            self.session.pan_by(response.drag_delta(), now);
        }

        self.session.hover_at(response.hover_pos(), now);
        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.session.click_at(pointer, now);
        }

        if self.session.tick(now) {
            ui.ctx().request_repaint();
        }

        let scene = self.session.scene();
        if let Some(renderer) = slot.session_mut() {
            renderer.paint(ui, rect, &scene);
        }
    }

    fn handle_graph_zoom(&mut self, ui: &Ui, rect: egui::Rect, response: &egui::Response, now: f64) {
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

        // Scrolling up zooms in, which shrinks world units per pixel.
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.session.zoom_at(pointer, 1.0 / zoom_factor, now);
    }
}
