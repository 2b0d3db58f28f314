use eframe::egui::{self, RichText, TextEdit, Ui};

use crate::knowledge::NodeKind;
use crate::util::truncate_chars;

use super::super::graph::GraphView;
use super::super::render_utils::kind_color;

const ROW_LABEL_MAX_CHARS: usize = 60;

struct ResultRow {
    index: usize,
    kind: NodeKind,
    label: String,
    id: String,
}

impl GraphView {
    pub(in crate::app) fn draw_search_panel(&mut self, ui: &mut Ui, now: f64) {
        ui.horizontal(|ui| {
            ui.heading("Search");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Close").clicked() {
                    self.search_mut().close_panel();
                }
            });
        });
        ui.add_space(6.0);

        let mut query = self.search().query().to_owned();
        let response = ui.add(
            TextEdit::singleline(&mut query)
                .hint_text("id, name, statement, content...")
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.search_mut().set_query(&query);
        }

        ui.add_space(6.0);
        let kinds = self.search().available_kinds().to_vec();
        ui.horizontal_wrapped(|ui| {
            for (kind, count) in kinds {
                let active = self.search().is_kind_active(kind);
                let text = RichText::new(format!("{} ({count})", kind.label())).color(kind_color(kind));
                if ui.selectable_label(active, text).clicked() {
                    self.search_mut().toggle_kind(kind);
                }
            }
        });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let search = self.search();
            ui.label(format!(
                "showing {} of {} ({} total)",
                search.visible_results().len(),
                search.filtered_count(),
                search.total_count()
            ));
            if search.is_filtering() && ui.small_button("Clear").clicked() {
                self.search_mut().clear();
            }
        });
        ui.separator();

        let rows = self
            .search()
            .visible_results()
            .iter()
            .filter_map(|&index| {
                self.graph().node(index).map(|node| ResultRow {
                    index,
                    kind: node.kind,
                    label: truncate_chars(node.label(), ROW_LABEL_MAX_CHARS).into_owned(),
                    id: node.id.clone(),
                })
            })
            .collect::<Vec<_>>();

        if rows.is_empty() {
            ui.label("No nodes match the current filters.");
            return;
        }

        let selected = self.selection().selected();
        egui::ScrollArea::vertical()
            .id_salt("search_results_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for row in rows {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("●").color(kind_color(row.kind)));
                        let clicked = ui
                            .selectable_label(selected == Some(row.index), row.label.as_str())
                            .on_hover_text(format!("{} ({})", row.id, row.kind.label()))
                            .clicked();
                        if clicked {
                            self.select_node(row.index, now);
                        }
                    });
                }
            });
    }
}
