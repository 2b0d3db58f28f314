use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use crate::util::truncate_chars;

use super::super::render_utils::{
    HIGHLIGHT_COLOR, HOVER_COLOR, NEIGHBOR_COLOR, SELECTED_COLOR, blend_color, circle_visible,
    dim_color, draw_arrow, draw_background, edge_visible, kind_color,
};
use super::scene::{NodeEmphasis, SceneNode};
use super::GraphView;

const LABEL_MAX_CHARS: usize = 42;

fn node_fill(node: &SceneNode) -> Color32 {
    let base = kind_color(node.kind);
    let color = if node.hovered {
        blend_color(base, HOVER_COLOR, 0.55)
    } else if node.highlighted {
        blend_color(base, HIGHLIGHT_COLOR, 0.75)
    } else {
        match node.emphasis {
            NodeEmphasis::Selected | NodeEmphasis::Plain => base,
            NodeEmphasis::Neighbor => blend_color(base, NEIGHBOR_COLOR, 0.35),
            NodeEmphasis::Faded => dim_color(base, 0.52),
        }
    };
    if node.filtered_out {
        dim_color(color, 0.38)
    } else {
        color
    }
}

impl GraphView {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let now = ui.input(|input| input.time);

        self.observe_size(rect.size(), now);
        draw_background(&painter, rect, self.viewport.transform());

        if self.graph.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No data in this graph",
                FontId::proportional(18.0),
                Color32::from_gray(200),
            );
            return;
        }

        let scene = self.scene();
        self.handle_canvas_input(ui, rect, &response, &scene, now);
        if self.advance(now) || response.dragged() {
            ui.ctx().request_repaint();
        }

        let zoom_sqrt = scene.scale.sqrt();
        for edge in &scene.edges {
            let start = rect.min + edge.from;
            let end = rect.min + edge.to;
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let (width, color) = if edge.in_ego_network {
                ((2.2 * zoom_sqrt).clamp(1.2, 4.4), NEIGHBOR_COLOR)
            } else if edge.faded {
                (
                    (0.8 * zoom_sqrt).clamp(0.45, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 90),
                )
            } else {
                (
                    (1.1 * zoom_sqrt).clamp(0.6, 3.0),
                    Color32::from_rgba_unmultiplied(120, 128, 140, 190),
                )
            };
            draw_arrow(&painter, start, end, edge.target_radius, Stroke::new(width, color));
        }

        let mut selection_animating = false;
        for node in &scene.nodes {
            let position = rect.min + node.position;
            if !circle_visible(rect, position, node.radius + 6.0) {
                continue;
            }

            let is_selected = node.emphasis == NodeEmphasis::Selected;
            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.index)),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }

            let color = blend_color(node_fill(node), SELECTED_COLOR, selection_mix * 0.8);
            painter.circle_filled(position, node.radius, color);
            if selection_mix > 0.0 {
                let halo_strength = (selection_mix * (1.0 - selection_mix) * 4.0).clamp(0.0, 1.0);
                let halo_alpha = (30.0 + (halo_strength * 145.0)) as u8;
                painter.circle_stroke(
                    position,
                    node.radius + 4.0 + ((1.0 - selection_mix) * 6.0),
                    Stroke::new(
                        1.0 + (halo_strength * 1.6),
                        Color32::from_rgba_unmultiplied(245, 206, 93, halo_alpha),
                    ),
                );
            }
            let outline = if node.highlighted {
                Stroke::new(2.0, HIGHLIGHT_COLOR)
            } else {
                Stroke::new(1.0 + selection_mix * 1.2, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, node.radius, outline);

            if let Some(label) = &node.label {
                let text_color = if node.filtered_out {
                    Color32::from_gray(130)
                } else {
                    Color32::from_gray(238)
                };
                painter.text(
                    position + vec2(node.radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_chars(label, LABEL_MAX_CHARS),
                    FontId::proportional(12.0),
                    text_color,
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if let Some(index) = self.hovered
            && let Some(node) = self.graph.node(index)
        {
            let panel_text = format!(
                "{}  |  {}  |  degree {}",
                truncate_chars(node.label(), 80),
                node.kind.label(),
                self.graph.degree(index)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.search.is_filtering() {
            painter.text(
                rect.left_bottom() + vec2(10.0, -10.0),
                Align2::LEFT_BOTTOM,
                format!(
                    "filter: {} of {} nodes",
                    self.search.filtered_count(),
                    self.search.total_count()
                ),
                FontId::proportional(12.0),
                Color32::from_gray(190),
            );
        }

        response.context_menu(|ui| {
            if ui.button("Reset view").clicked() {
                self.reset_view(now);
                ui.close();
            }
            if self.selection.selected().is_some() && ui.button("Clear selection").clicked() {
                self.clear_selection();
                ui.close();
            }
        });
    }
}
