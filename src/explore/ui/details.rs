use eframe::egui::{self, RichText, Ui};

use super::super::session::AnnotationStatus;
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::explore) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Focus Details");
        ui.add_space(6.0);

        let Some(details) = self.session.focus_details() else {
            ui.label("Click a protein, or pick one from search, to focus it.");
            if let Some(hovered) = self.session.view().focus.hovered {
                let node = &self.session.index().nodes[hovered];
                ui.add_space(6.0);
                ui.label(format!("Hovering: {}", node.label));
            }
            return;
        };

        let index = self.session.index();
        let node = &index.nodes[details.node];

        ui.label(RichText::new(node.label.as_str()).strong());
        if node.label != node.id {
            ui.small(node.id.as_str());
        }
        ui.add_space(6.0);

        ui.label(format!("Degree: {}", node.degree));
        if node.community >= 0 {
            ui.label(format!("Community: {}", node.community));
        }
        if let Some(locality) = &node.locality {
            ui.label(format!("Compartment: {locality}"));
        }
        ui.label(format!(
            "Visible neighbours: {} ({} novel)",
            details.counts.neighbor_count, details.counts.novel_neighbor_count
        ));
        if node.provenance.is_empty() {
            ui.label("Sources: none recorded");
        } else {
            ui.label(format!("Sources: {}", node.provenance.join(", ")));
        }

        ui.separator();
        ui.label(RichText::new("Annotation").strong());
        match details.annotation {
            AnnotationStatus::Idle => {
                ui.label("No lookup yet.");
            }
            AnnotationStatus::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Looking up...");
                });
            }
            AnnotationStatus::Ready(text) => {
                egui::ScrollArea::vertical()
                    .id_salt("annotation_scroll")
                    .max_height(180.0)
                    .show(ui, |ui| {
                        ui.label(text.as_str());
                    });
            }
            AnnotationStatus::Unavailable => {
                ui.label("No annotation available.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Neighbours").strong());
        if details.neighbors.is_empty() {
            ui.label("No neighbours pass the current filters.");
            return;
        }

        let mut jump = None;
        let row_count = details.neighbors.len().min(Self::NEIGHBOR_ROWS);
        egui::ScrollArea::vertical()
            .id_salt("neighbor_scroll")
            .max_height(320.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, row_count, |ui, row_range| {
                for row in row_range {
                    let Some(&neighbor) = details.neighbors.get(row) else {
                        continue;
                    };
                    let other = &index.nodes[neighbor];
                    let label = format!("{}  (degree {})", other.label, other.degree);
                    if ui.link(label).on_hover_text(other.id.as_str()).clicked() {
                        jump = Some(neighbor);
                    }
                }
            });
        if details.neighbors.len() > row_count {
            ui.small(format!("{} more not listed", details.neighbors.len() - row_count));
        }

        if let Some(neighbor) = jump {
            let now = ui.input(|input| input.time);
            self.session.search_jump(neighbor, now);
        }
    }
}
