use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout};

use crate::dataset::DatasetView;

use super::super::backend::{BackendKind, ViewportSlot};
use super::super::session::ExplorationSession;
use super::super::{PanelRequests, ViewModel};

impl ViewModel {
    pub(in crate::explore) const SEARCH_RESULT_LIMIT: usize = 12;
    pub(in crate::explore) const NEIGHBOR_ROWS: usize = 48;

    pub(in crate::explore) fn new(session: ExplorationSession) -> Self {
        Self {
            filter: session.view().filter,
            show_all_edges: session.view().show_all_edges,
            session,
            search: String::new(),
            search_hits: Vec::new(),
            search_query: String::new(),
            fitted: false,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::explore) fn show(
        &mut self,
        ctx: &Context,
        view: DatasetView,
        backend: Option<BackendKind>,
        slot: &mut ViewportSlot,
    ) -> PanelRequests {
        self.update_fps_counter(ctx);
        let mut requests = PanelRequests::default();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("interactome atlas");
                    ui.separator();
                    ui.label(format!("view: {}", view.label()));
                    ui.label(format!("detail: {:?}", self.session.lod_mode()).to_lowercase());
                    if let Some(backend) = backend {
                        ui.label(format!("renderer: {}", backend.label()));
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        ui.label(self.fps_display_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(350.0)
            .show(ctx, |ui| self.draw_controls(ui, view, &mut requests));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui, slot));

        requests
    }
}
