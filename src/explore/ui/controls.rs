use eframe::egui::{self, Ui};

use crate::dataset::DatasetView;

use super::super::{PanelRequests, ViewModel};

impl ViewModel {
    pub(in crate::explore) fn draw_controls(&mut self, ui: &mut Ui, view: DatasetView, requests: &mut PanelRequests) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.horizontal_wrapped(|ui| {
            for candidate in [DatasetView::Network, DatasetView::Locality] {
                let selected = candidate == view;
                if ui
                    .selectable_label(selected, candidate.label())
                    .on_hover_text(format!("Load {}.", candidate.file_name()))
                    .clicked()
                    && !selected
                {
                    requests.switch_view = Some(candidate);
                }
            }
            ui.separator();
            if ui
                .button("Reload")
                .on_hover_text("Re-read the dataset from disk.")
                .clicked()
            {
                requests.reload = true;
            }
            if ui
                .button("Fit graph")
                .on_hover_text("Frame the whole graph.")
                .clicked()
            {
                let now = ui.input(|input| input.time);
                self.session.reset_camera(now);
            }
        });

        ui.separator();
        self.draw_search(ui);
        ui.separator();
        self.draw_filters(ui);
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search (label or id)")
            .on_hover_text("Fuzzy-match proteins, then click one to focus it.");
        let response = ui.text_edit_singleline(&mut self.search);

        if self.search != self.search_query {
            self.search_query = self.search.clone();
            self.search_hits = self
                .session
                .index()
                .search(&self.search_query, Self::SEARCH_RESULT_LIMIT);
        }

        let now = ui.input(|input| input.time);
        let enter = response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
        if enter && let Some(&first) = self.search_hits.first() {
            self.session.search_jump(first, now);
        }

        let mut jump = None;
        for &hit in &self.search_hits {
            let node = &self.session.index().nodes[hit];
            let text = if node.label == node.id {
                format!("{}  (degree {})", node.label, node.degree)
            } else {
                format!("{}  [{}]  (degree {})", node.label, node.id, node.degree)
            };
            if ui.link(text).clicked() {
                jump = Some(hit);
            }
        }
        if let Some(node) = jump {
            self.session.search_jump(node, now);
        }
    }

    fn draw_filters(&mut self, ui: &mut Ui) {
        let max_degree = self
            .session
            .index()
            .nodes
            .iter()
            .map(|node| node.degree)
            .max()
            .unwrap_or(0)
            .max(1);

        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut self.filter.degree_floor, 0..=max_degree).text("Minimum degree"))
            .on_hover_text("Hide proteins with fewer interaction partners.")
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut self.filter.confidence_floor, 0.0..=1.0)
                    .step_by(0.01)
                    .text("Minimum confidence"),
            )
            .on_hover_text("Hide scored interactions below this confidence. Unscored ones stay visible.")
            .changed();
        changed |= ui
            .checkbox(&mut self.filter.only_novel, "Only novel interactions")
            .on_hover_text("Keep interactions with no prior database support.")
            .changed();
        if changed {
            self.session.set_filter(self.filter);
        }

        if ui
            .checkbox(&mut self.show_all_edges, "Show all edges")
            .on_hover_text("Draw every visible edge while nothing is focused.")
            .changed()
        {
            self.session.set_show_all_edges(self.show_all_edges);
        }

        if ui.button("Reset filters").clicked() {
            self.filter = Default::default();
            self.session.set_filter(self.filter);
        }
    }
}
