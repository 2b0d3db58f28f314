use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Stroke, Ui, vec2};

use crate::knowledge::{Connection, NodeKind};
use crate::util::truncate_chars;

use super::super::ego::NODE_RADIUS;
use super::super::graph::{GraphView, LOCAL_GRAPH_SIZE};
use super::super::render_utils::{SELECTED_COLOR, draw_arrow, kind_color};

const CONTENT_PREVIEW_CHARS: usize = 280;
const LOCAL_LABEL_CHARS: usize = 18;

struct ConnectionRow {
    index: usize,
    label: String,
    kind: NodeKind,
    relation: Option<String>,
    context: Option<String>,
}

impl GraphView {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, now: f64) {
        let Some(selected) = self.selection().selected() else {
            return;
        };
        let Some(node) = self.graph().node(selected).cloned() else {
            return;
        };

        ui.horizontal(|ui| {
            ui.heading("Details");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Close").clicked() {
                    self.clear_selection();
                }
            });
        });
        if self.selection().selected().is_none() {
            return;
        }
        ui.add_space(6.0);

        ui.label(RichText::new(node.kind.label()).color(kind_color(node.kind)).strong());
        ui.label(RichText::new(node.label()).heading());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        let fields = [
            ("Name", node.name.as_deref()),
            ("Canonical name", node.canonical_name.as_deref()),
            ("Entity type", node.entity_type.as_deref()),
            ("Year", node.year.as_deref()),
            ("Paper", node.paper_id.as_deref()),
        ];
        for (title, value) in fields {
            if let Some(value) = value {
                ui.label(format!("{title}: {value}"));
            }
        }
        if let Some(statement) = &node.statement {
            ui.add_space(4.0);
            ui.label(RichText::new("Statement").strong());
            ui.label(statement.as_str());
        }

        if let Some(content) = node.content.as_deref().filter(|content| !content.trim().is_empty()) {
            ui.add_space(4.0);
            ui.label(RichText::new("Content").strong());
            let truncated = content.chars().count() > CONTENT_PREVIEW_CHARS;
            if self.show_full_content() || !truncated {
                egui::ScrollArea::vertical()
                    .id_salt("node_content_scroll")
                    .max_height(240.0)
                    .show(ui, |ui| ui.label(content));
            } else {
                ui.label(truncate_chars(content, CONTENT_PREVIEW_CHARS));
            }
            if truncated {
                let toggle = if self.show_full_content() {
                    "Show less"
                } else {
                    "Show full content"
                };
                if ui.link(toggle).clicked() {
                    let show = !self.show_full_content();
                    self.set_show_full_content(show);
                }
            }
        }

        ui.separator();
        let mut show_local = self.selection().show_local_graph();
        if ui.checkbox(&mut show_local, "Local graph").changed() {
            self.set_show_local_graph(show_local, now);
        }
        if self.local_graph().is_some() {
            self.draw_local_graph(ui, now);
        }

        let (incoming, outgoing) = self.connection_rows();
        ui.separator();
        self.draw_connection_list(ui, "Incoming", "incoming_scroll", &incoming, now);
        ui.separator();
        self.draw_connection_list(ui, "Outgoing", "outgoing_scroll", &outgoing, now);
    }

    fn connection_rows(&self) -> (Vec<ConnectionRow>, Vec<ConnectionRow>) {
        let Some(ego) = self.selection().ego_network() else {
            return (Vec::new(), Vec::new());
        };
        let to_row = |connection: &Connection| {
            let node = self.graph().node(connection.node)?;
            let edge = self.graph().edge(connection.edge)?;
            Some(ConnectionRow {
                index: connection.node,
                label: node.label().to_owned(),
                kind: node.kind,
                relation: edge.kind.clone(),
                context: edge.context.clone(),
            })
        };
        (
            ego.incoming.iter().filter_map(to_row).collect(),
            ego.outgoing.iter().filter_map(to_row).collect(),
        )
    }

    fn draw_connection_list(
        &mut self,
        ui: &mut Ui,
        title: &str,
        scroll_id: &str,
        rows: &[ConnectionRow],
        now: f64,
    ) {
        ui.label(RichText::new(format!("{title} ({})", rows.len())).strong());
        if rows.is_empty() {
            ui.label("None");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt(scroll_id)
            .max_height(200.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for row in rows {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("●").color(kind_color(row.kind)));
                        let mut text = truncate_chars(&row.label, 64).into_owned();
                        if let Some(relation) = &row.relation {
                            text = format!("{text}  [{relation}]");
                        }
                        let mut link = ui.link(text);
                        if let Some(context) = &row.context {
                            link = link.on_hover_text(context.as_str());
                        }
                        if link.clicked() {
                            self.select_node(row.index, now);
                        }
                    });
                }
            });
    }

    fn draw_local_graph(&mut self, ui: &mut Ui, now: f64) {
        let (rect, response) = ui.allocate_exact_size(LOCAL_GRAPH_SIZE, Sense::click());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 4.0, Color32::from_rgb(24, 28, 35));

        let Some(local) = self.local_graph() else {
            return;
        };
        let positions = local.positions();
        if local.is_running() {
            ui.ctx().request_repaint();
        }

        for &(source, target) in local.links() {
            let (Some(from), Some(to)) = (positions.get(source), positions.get(target)) else {
                continue;
            };
            draw_arrow(
                &painter,
                rect.min + *from,
                rect.min + *to,
                NODE_RADIUS,
                Stroke::new(1.2, Color32::from_rgba_unmultiplied(150, 156, 168, 200)),
            );
        }

        for (node, position) in local.nodes().iter().zip(&positions) {
            let center = rect.min + *position;
            painter.circle_filled(center, NODE_RADIUS, kind_color(node.kind));
            if node.is_center {
                painter.circle_stroke(center, NODE_RADIUS + 2.5, Stroke::new(2.0, SELECTED_COLOR));
                if local.has_self_loop() {
                    painter.circle_stroke(
                        center - vec2(0.0, NODE_RADIUS * 1.8),
                        NODE_RADIUS * 0.9,
                        Stroke::new(1.2, Color32::from_rgba_unmultiplied(150, 156, 168, 200)),
                    );
                }
            }
            painter.text(
                center + vec2(0.0, NODE_RADIUS + 3.0),
                Align2::CENTER_TOP,
                truncate_chars(&node.label, LOCAL_LABEL_CHARS),
                FontId::proportional(10.5),
                Color32::from_gray(225),
            );
        }

        if !local.has_connections() {
            painter.text(
                rect.center() + vec2(0.0, NODE_RADIUS + 24.0),
                Align2::CENTER_TOP,
                "No connections",
                FontId::proportional(13.0),
                Color32::from_gray(170),
            );
        }

        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.select_in_local_graph(pointer - rect.min, now);
        }
    }
}
