use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::knowledge::{KnowledgeGraph, load_graph};

mod ego;
mod graph;
mod physics;
mod render_utils;
mod resize;
mod retry;
mod search;
mod selection;
mod ui;
mod viewport;

use self::graph::GraphView;

pub(crate) use self::graph::LaunchOptions;

type LoadResult = Result<KnowledgeGraph, String>;

pub struct ExplorerApp {
    source: PathBuf,
    launch: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<GraphView>),
    Error(String),
}

impl ExplorerApp {
    pub(crate) fn new(_cc: &eframe::CreationContext<'_>, source: PathBuf, launch: LaunchOptions) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            launch,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_graph(&source).map_err(|error| {
                tracing::error!(path = %source.display(), "failed to load graph: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, graph: KnowledgeGraph, now: f64) -> AppState {
        AppState::Ready(Box::new(GraphView::new(graph, &self.launch, now)))
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;
        let now = ctx.input(|input| input.time);

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(view) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                let source = self.source.display().to_string();
                view.show(ctx, &source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.source.clone());
            return;
        }

        if let Some(result) = transition {
            if let AppState::Ready(view) = &mut self.state {
                view.dispose();
            }
            self.reload_rx = None;
            self.state = match result {
                Ok(graph) => self.ready(graph, now),
                Err(error) => AppState::Error(error),
            };
            ctx.request_repaint();
        }
    }
}
