use eframe::egui::Context;

use crate::util::format_count;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::explore) fn update_fps_counter(&mut self, ctx: &Context) {
        const FPS_SAMPLE_WINDOW: usize = 180;

        let dt = ctx.input(|input| input.stable_dt);
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::explore) fn fps_display_text(&self) -> String {
        let mut parts = vec![format!("FPS {:.0}", self.fps_current)];

        if !self.fps_samples.is_empty() {
            let avg = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
            parts.push(format!("avg {avg:.1}"));
        }
        if let Some(low) = self.fps_samples.iter().copied().reduce(f32::min) {
            parts.push(format!("low {low:.0}"));
        }

        parts.join(" | ")
    }

    pub(in crate::explore) fn visible_graph_text(&self) -> String {
        let outcome = self.session.filter_outcome();
        let index = self.session.index();
        format!(
            "visible: {} / {} nodes, {} / {} edges ({} novel)",
            format_count(outcome.visible_nodes),
            format_count(index.node_count()),
            format_count(outcome.visible_edges),
            format_count(index.edge_count()),
            format_count(outcome.visible_novel_edges),
        )
    }
}
