use eframe::egui::{self, Align, Context, Key, KeyboardShortcut, Layout, Modifiers};

use super::super::graph::GraphView;

const SEARCH_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::F);

impl GraphView {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &str,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        self.handle_shortcuts(ctx);
        let now = ctx.input(|input| input.time);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("kg-explorer");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!("nodes: {}", self.graph().node_count()));
                    ui.label(format!("edges: {}", self.graph().edge_count()));
                    if self.graph().dropped_edge_count() > 0 {
                        ui.label(format!("dropped edges: {}", self.graph().dropped_edge_count()))
                            .on_hover_text("Edges whose endpoints are missing from the node list");
                    }
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload graph"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Reset view").clicked() {
                        self.reset_view(now);
                    }
                    let search_open = self.search().is_panel_open();
                    if ui
                        .selectable_label(search_open, "Search")
                        .on_hover_text(format!(
                            "Toggle the search panel ({} or /)",
                            ctx.format_shortcut(&SEARCH_SHORTCUT)
                        ))
                        .clicked()
                    {
                        self.search_mut().toggle_panel();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let state = if self.is_layout_running() {
                            "running"
                        } else {
                            "settled"
                        };
                        ui.label(format!("layout {state}  alpha {:.3}", self.alpha()));
                    });
                });
            });

        if self.search().is_panel_open() {
            egui::SidePanel::left("search")
                .resizable(true)
                .default_width(340.0)
                .show(ctx, |ui| self.draw_search_panel(ui, now));
        }

        if self.selection().selected().is_some() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(360.0)
                .show(ctx, |ui| self.draw_details(ui, now));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if is_reloading {
                    ui.ctx().request_repaint();
                }
                self.draw_canvas(ui);
            });
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        let toggle = ctx.input_mut(|input| input.consume_shortcut(&SEARCH_SHORTCUT));
        let slash = !ctx.wants_keyboard_input()
            && ctx.input_mut(|input| input.consume_key(Modifiers::NONE, Key::Slash));
        if toggle || slash {
            self.open_search_panel();
        }
        if !ctx.wants_keyboard_input()
            && ctx.input_mut(|input| input.consume_key(Modifiers::NONE, Key::Escape))
        {
            self.clear_selection();
        }
    }
}
