use std::collections::HashSet;

use eframe::egui::{Vec2, vec2};

use crate::knowledge::KnowledgeGraph;

use super::ego::EgoGraphSimulation;
use super::physics::{ForceConfig, LayoutSimulation};
use super::resize::ResizeCoordinator;
use super::retry::CancelToken;
use super::search::SearchFilterIndex;
use super::selection::{SelectionChange, SelectionController};
use super::viewport::{FOCUS_SCALE, ViewportController};

mod interaction;
mod scene;
mod view;

use scene::{GraphState, SceneDescription, describe_scene};

/// Canvas size assumed until the first frame reports the real one.
const INITIAL_CANVAS: Vec2 = vec2(1200.0, 800.0);
pub(in crate::app) const LOCAL_GRAPH_SIZE: Vec2 = vec2(320.0, 260.0);

/// Deep-link parameters applied once when a view is created.
#[derive(Clone, Debug, Default)]
pub(crate) struct LaunchOptions {
    pub focus: Option<String>,
    pub highlight: Vec<String>,
    pub open_search: bool,
}

/// Owns one loaded graph and every controller attached to it.
///
/// Call [`dispose`](Self::dispose) before dropping a view that is being
/// replaced; afterwards `advance` is a no-op.
pub(in crate::app) struct GraphView {
    graph: KnowledgeGraph,
    simulation: LayoutSimulation,
    viewport: ViewportController,
    selection: SelectionController,
    search: SearchFilterIndex,
    resize: ResizeCoordinator,
    ego: Option<EgoGraphSimulation>,
    highlighted: HashSet<usize>,
    hovered: Option<usize>,
    dragging: Option<usize>,
    focus_token: Option<CancelToken>,
    /// Node held in place while the view animates onto it.
    focus_pin: Option<usize>,
    focus_requests: u64,
    disposed: bool,
}

impl GraphView {
    pub(in crate::app) fn new(graph: KnowledgeGraph, launch: &LaunchOptions, now: f64) -> Self {
        let simulation = LayoutSimulation::new(&graph, INITIAL_CANVAS, ForceConfig::default());
        let search = SearchFilterIndex::new(&graph);
        let mut view = Self {
            graph,
            simulation,
            viewport: ViewportController::new(INITIAL_CANVAS),
            selection: SelectionController::default(),
            search,
            resize: ResizeCoordinator::default(),
            ego: None,
            highlighted: HashSet::new(),
            hovered: None,
            dragging: None,
            focus_token: None,
            focus_pin: None,
            focus_requests: 0,
            disposed: false,
        };
        view.apply_launch_options(launch, now);
        view
    }

    fn apply_launch_options(&mut self, launch: &LaunchOptions, now: f64) {
        if !launch.highlight.is_empty() {
            self.highlight(&launch.highlight);
        }
        if launch.open_search {
            self.open_search_panel();
        }
        if let Some(id) = launch.focus.as_deref() {
            match self.graph.index_of(id) {
                Some(index) => self.select_node(index, now),
                None => self.focus_on(id, now),
            }
        }
    }

    pub(in crate::app) fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub(in crate::app) fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub(in crate::app) fn search(&self) -> &SearchFilterIndex {
        &self.search
    }

    pub(in crate::app) fn search_mut(&mut self) -> &mut SearchFilterIndex {
        &mut self.search
    }

    pub(in crate::app) fn local_graph(&self) -> Option<&EgoGraphSimulation> {
        self.ego.as_ref()
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.simulation.alpha()
    }

    pub(in crate::app) fn is_layout_running(&self) -> bool {
        self.simulation.is_running()
    }

    /// Selects a node and focuses the viewport on it. Reselecting only re-focuses.
    pub(in crate::app) fn select_node(&mut self, index: usize, now: f64) {
        match self.selection.select(&self.graph, index) {
            SelectionChange::Ignored => {}
            SelectionChange::Replaced => {
                self.close_local_graph();
                self.release_focus_pin();
                self.focus_on_index(index, now);
            }
            SelectionChange::Reselected => self.focus_on_index(index, now),
        }
    }

    #[cfg(test)]
    pub(in crate::app) fn select_by_id(&mut self, id: &str, now: f64) {
        if let Some(index) = self.graph.index_of(id) {
            self.select_node(index, now);
        }
    }

    pub(in crate::app) fn clear_selection(&mut self) {
        self.selection.clear();
        self.close_local_graph();
        self.cancel_focus();
    }

    /// Best-effort focus; unknown ids simply never resolve.
    pub(in crate::app) fn focus_on(&mut self, node_id: &str, now: f64) {
        self.focus_requests += 1;
        self.release_focus_pin();
        self.focus_token = Some(self.viewport.focus_on(node_id, FOCUS_SCALE, now));
    }

    fn cancel_focus(&mut self) {
        if let Some(token) = self.focus_token.take() {
            token.cancel();
        }
        self.release_focus_pin();
    }

    fn release_focus_pin(&mut self) {
        if let Some(index) = self.focus_pin.take()
            && self.dragging != Some(index)
        {
            self.simulation.unpin(index);
        }
    }

    fn focus_on_index(&mut self, index: usize, now: f64) {
        if let Some(node) = self.graph.node(index) {
            let id = node.id.clone();
            self.focus_on(&id, now);
        }
    }

    /// Replaces the highlight set; ids missing from this graph are skipped.
    pub(in crate::app) fn highlight<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        self.highlighted = ids
            .iter()
            .filter_map(|id| self.graph.index_of(id.as_ref()))
            .collect();
        self.highlighted.len()
    }

    pub(in crate::app) fn open_search_panel(&mut self) {
        self.search.open_panel();
    }

    pub(in crate::app) fn reset_view(&mut self, now: f64) {
        self.cancel_focus();
        self.viewport.reset(now);
    }

    pub(in crate::app) fn show_full_content(&self) -> bool {
        self.selection.show_full_content()
    }

    pub(in crate::app) fn set_show_full_content(&mut self, show: bool) {
        self.selection.set_show_full_content(show);
    }

    pub(in crate::app) fn set_show_local_graph(&mut self, show: bool, now: f64) {
        self.selection.set_show_local_graph(show);
        if !self.selection.show_local_graph() {
            self.close_local_graph();
            return;
        }
        self.close_local_graph();
        if let (Some(center), Some(ego)) = (self.selection.selected(), self.selection.ego_network())
        {
            self.ego = Some(EgoGraphSimulation::new(
                &self.graph,
                center,
                ego,
                LOCAL_GRAPH_SIZE,
                now,
            ));
        }
    }

    /// Click inside the local graph panel: re-selects the hit node and keeps the panel open.
    pub(in crate::app) fn select_in_local_graph(&mut self, point: Vec2, now: f64) {
        let Some(index) = self.ego.as_ref().and_then(|ego| ego.hit_test(point)) else {
            return;
        };
        if self.selection.selected() == Some(index) {
            return;
        }
        self.select_node(index, now);
        self.set_show_local_graph(true, now);
    }

    fn close_local_graph(&mut self) {
        if let Some(mut ego) = self.ego.take() {
            ego.stop();
        }
    }

    pub(in crate::app) fn drag_start(&mut self, index: usize) {
        if index < self.simulation.len() {
            if self.focus_pin == Some(index) {
                self.focus_pin = None;
            }
            self.dragging = Some(index);
            self.simulation.drag_start(index);
        }
    }

    /// Moves the dragged node to a canvas-local pointer position.
    pub(in crate::app) fn drag_move(&mut self, canvas: Vec2) {
        if let Some(index) = self.dragging {
            let world = self.viewport.transform().invert(canvas);
            self.simulation.drag_move(index, world);
        }
    }

    pub(in crate::app) fn drag_end(&mut self) {
        if let Some(index) = self.dragging.take() {
            self.simulation.drag_end(index);
        }
    }

    pub(in crate::app) fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Reports the canvas size seen this frame; changes are applied after the debounce.
    pub(in crate::app) fn observe_size(&mut self, size: Vec2, now: f64) {
        if let Some(size) = self.resize.observe(size, now) {
            self.apply_size(size);
        }
    }

    fn apply_size(&mut self, size: Vec2) {
        self.viewport.set_size(size);
        self.simulation.resize(size);
        tracing::debug!(width = size.x, height = size.y, "canvas resize applied");
    }

    /// Runs one frame of every time-driven component. Returns whether another frame is needed.
    pub(in crate::app) fn advance(&mut self, now: f64) -> bool {
        if self.disposed {
            return false;
        }

        if let Some(size) = self.resize.poll(now) {
            self.apply_size(size);
        }
        let layout_running = self.simulation.tick();

        let graph = &self.graph;
        let simulation = &self.simulation;
        let mut located = None;
        let resolved = self.viewport.poll_focus(now, |id| {
            let index = graph.index_of(id)?;
            let position = simulation.position(index)?;
            located = Some(index);
            Some(position)
        });
        if let (Some(index), Some(position)) = (located, resolved) {
            self.focus_token = None;
            if self.dragging != Some(index) {
                self.simulation.pin(index, position);
                self.focus_pin = Some(index);
            }
        }
        let animating = self.viewport.update(now);
        if !self.viewport.is_animating() {
            self.release_focus_pin();
        }

        let local_running = self.ego.as_mut().is_some_and(|ego| ego.tick(now));

        layout_running
            || animating
            || local_running
            || self.viewport.has_pending_focus()
            || self.resize.has_pending()
    }

    pub(in crate::app) fn scene(&self) -> SceneDescription {
        describe_scene(&GraphState {
            graph: &self.graph,
            simulation: &self.simulation,
            transform: self.viewport.transform(),
            selection: &self.selection,
            search: &self.search,
            highlighted: &self.highlighted,
            hovered: self.hovered,
        })
    }

    /// Stops the layout, the local graph and any pending focus. Idempotent.
    pub(in crate::app) fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.simulation.stop();
        self.cancel_focus();
        self.dragging = None;
        self.close_local_graph();
        tracing::debug!(nodes = self.graph.node_count(), "graph view disposed");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::app::ego::RUN_BUDGET_SECS;
    use crate::app::viewport::{FOCUS_POLL_ATTEMPTS, FOCUS_POLL_INTERVAL_SECS, ViewTransform};
    use crate::knowledge::Connection;
    use crate::knowledge::fixtures::{chain_graph, hub_graph};

    const FRAME: f64 = 1.0 / 60.0;

    fn run_frames(view: &mut GraphView, from: f64, frames: usize) -> f64 {
        let mut now = from;
        for _ in 0..frames {
            view.advance(now);
            now += FRAME;
        }
        now
    }

    #[test]
    fn selecting_b_exposes_its_ego_network() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        let b = view.graph().index_of("B").unwrap();

        view.select_node(b, 0.0);

        let ego = view.selection().ego_network().unwrap();
        assert_eq!(ego.incoming, vec![Connection { node: 0, edge: 0 }]);
        assert_eq!(ego.outgoing, vec![Connection { node: 2, edge: 1 }]);
    }

    #[test]
    fn reselecting_keeps_the_ego_network_but_focuses_again() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.select_node(1, 0.0);
        let ego = view.selection().ego_network().cloned();
        let requests = view.focus_requests;

        view.select_node(1, 0.5);

        assert_eq!(view.selection().ego_network().cloned(), ego);
        assert_eq!(view.selection.ego_computations(), 1);
        assert_eq!(view.focus_requests, requests + 1);
        assert!(view.viewport.has_pending_focus());
    }

    #[test]
    fn selection_focus_lands_once_the_layout_places_the_node() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.observe_size(vec2(800.0, 600.0), 0.0);

        view.select_node(2, 0.0);
        run_frames(&mut view, 0.0, 90);

        let transform = view.viewport.transform();
        assert_eq!(transform.scale, FOCUS_SCALE);
        assert!(!view.viewport.has_pending_focus());
    }

    #[test]
    fn focused_node_ends_up_centred_while_the_layout_moves() {
        let mut view = GraphView::new(hub_graph(40), &LaunchOptions::default(), 0.0);
        view.observe_size(vec2(800.0, 600.0), 0.0);
        let spoke = view.graph().index_of("spoke7").unwrap();

        view.select_node(spoke, 0.0);
        let mut now = run_frames(&mut view, 0.0, 10);
        assert!(view.viewport.is_animating());
        assert!(view.simulation.pinned(spoke).is_some());
        while view.viewport.is_animating() {
            view.advance(now);
            now += FRAME;
            assert!(now < 5.0, "focus transition never finished");
        }

        let position = view.simulation.position(spoke).unwrap();
        let canvas = view.viewport.transform().apply(position);
        let off_centre = (canvas - vec2(400.0, 300.0)).length();
        assert!(off_centre < 2.0, "focused node is {off_centre} px off centre");
        assert_eq!(view.simulation.pinned(spoke), None);
        assert!(view.is_layout_running());
    }

    #[test]
    fn focus_pin_is_released_by_pan_and_by_a_new_selection() {
        let mut view = GraphView::new(hub_graph(5), &LaunchOptions::default(), 0.0);
        let first = view.graph().index_of("spoke1").unwrap();
        let second = view.graph().index_of("spoke2").unwrap();

        view.select_node(first, 0.0);
        let now = run_frames(&mut view, 0.0, 3);
        assert!(view.simulation.pinned(first).is_some());
        view.viewport.pan_by(vec2(10.0, 0.0));
        view.advance(now);
        assert_eq!(view.simulation.pinned(first), None);

        view.select_node(first, now);
        let now = run_frames(&mut view, now, 3);
        assert!(view.simulation.pinned(first).is_some());
        view.select_node(second, now);
        assert_eq!(view.simulation.pinned(first), None);
    }

    #[test]
    fn deselecting_cancels_a_pending_focus() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.select_node(2, 0.0);
        assert!(view.viewport.has_pending_focus());

        view.clear_selection();
        run_frames(&mut view, 0.0, 60);

        assert!(!view.viewport.has_pending_focus());
        assert_eq!(view.viewport.transform(), ViewTransform::IDENTITY);
        assert!(view.focus_pin.is_none());
    }

    #[test]
    fn focusing_an_unknown_id_changes_nothing() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        let before = view.viewport.transform();

        view.focus_on("nonexistent-id", 0.0);
        let budget = FOCUS_POLL_INTERVAL_SECS * f64::from(FOCUS_POLL_ATTEMPTS) + 0.5;
        run_frames(&mut view, 0.0, (budget / FRAME) as usize);

        assert_eq!(view.selection().selected(), None);
        assert_eq!(view.viewport.transform(), before);
        assert!(!view.viewport.has_pending_focus());
    }

    #[test]
    fn resize_recenters_and_reheats_the_layout() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.observe_size(vec2(1200.0, 800.0), 0.0);
        let mut now = 0.0;
        while view.is_layout_running() {
            view.advance(now);
            now += FRAME;
        }
        assert_eq!(view.simulation.center(), vec2(600.0, 400.0));

        view.observe_size(vec2(600.0, 400.0), now);
        view.advance(now);
        assert_eq!(view.simulation.center(), vec2(600.0, 400.0));
        view.advance(now + 0.15);

        assert_eq!(view.simulation.center(), vec2(300.0, 200.0));
        assert_eq!(view.viewport.size(), vec2(600.0, 400.0));
        assert!(view.alpha() > 0.0);
        assert!(view.is_layout_running());
    }

    #[test]
    fn isolated_node_gets_a_static_local_graph() {
        let mut view = GraphView::new(hub_graph(3), &LaunchOptions::default(), 0.0);
        view.select_by_id("lonely", 0.0);

        view.set_show_local_graph(true, 0.0);

        let local = view.local_graph().unwrap();
        assert!(!local.has_connections());
        assert!(!local.is_running());
        assert_eq!(local.nodes().len(), 1);
    }

    #[test]
    fn local_graph_stops_on_deselect_and_on_budget() {
        let mut view = GraphView::new(hub_graph(3), &LaunchOptions::default(), 0.0);
        view.select_by_id("hub", 0.0);
        view.set_show_local_graph(true, 0.0);
        assert!(view.local_graph().unwrap().is_running());

        run_frames(&mut view, 0.0, ((RUN_BUDGET_SECS + 0.5) / FRAME) as usize);
        assert!(!view.local_graph().unwrap().is_running());

        view.clear_selection();
        assert!(view.local_graph().is_none());
        assert!(!view.selection().show_local_graph());
    }

    #[test]
    fn clicking_in_the_local_graph_chains_the_selection() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.select_by_id("B", 0.0);
        view.set_show_local_graph(true, 0.0);
        let c_position = view.local_graph().unwrap().positions()[2];

        view.select_in_local_graph(c_position, 0.1);

        assert_eq!(view.selection().selected(), view.graph().index_of("C"));
        let local = view.local_graph().unwrap();
        assert_eq!(local.center_index(), view.graph().index_of("C"));
        assert!(view.selection().show_local_graph());
    }

    #[test]
    fn selecting_another_node_closes_the_local_graph() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.select_node(1, 0.0);
        view.set_show_local_graph(true, 0.0);

        view.select_node(0, 0.1);

        assert!(view.local_graph().is_none());
    }

    #[test]
    fn drag_through_the_view_lands_on_the_pointer() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.observe_size(vec2(800.0, 600.0), 0.0);
        view.viewport.apply_user_pan_zoom(ViewTransform {
            translate: vec2(50.0, 20.0),
            scale: 2.0,
        });
        run_frames(&mut view, 0.0, 5);

        view.drag_start(0);
        view.drag_move(vec2(450.0, 320.0));
        view.advance(0.2);
        view.drag_end();

        assert!(!view.is_dragging());
        assert_eq!(view.simulation.pinned(0), None);
        assert_eq!(view.simulation.position(0), Some(vec2(200.0, 150.0)));
    }

    #[test]
    fn launch_options_apply_once_and_skip_unknown_ids() {
        let launch = LaunchOptions {
            focus: Some("C".to_owned()),
            highlight: vec!["A".to_owned(), "missing".to_owned()],
            open_search: true,
        };

        let view = GraphView::new(chain_graph(), &launch, 0.0);

        assert_eq!(view.selection().selected(), Some(2));
        assert!(view.viewport.has_pending_focus());
        assert_eq!(view.highlighted, HashSet::from([0]));
        assert!(view.search().is_panel_open());
    }

    #[test]
    fn unknown_launch_focus_does_not_select() {
        let launch = LaunchOptions {
            focus: Some("elsewhere".to_owned()),
            ..LaunchOptions::default()
        };

        let view = GraphView::new(chain_graph(), &launch, 0.0);

        assert_eq!(view.selection().selected(), None);
    }

    #[test]
    fn dispose_stops_all_activity() {
        let mut view = GraphView::new(hub_graph(4), &LaunchOptions::default(), 0.0);
        view.select_by_id("hub", 0.0);
        view.set_show_local_graph(true, 0.0);

        view.dispose();
        view.dispose();

        assert!(!view.is_layout_running());
        assert!(!view.viewport.has_pending_focus());
        assert!(view.local_graph().is_none());
        assert!(!view.advance(1.0));
        assert_eq!(view.simulation.ticks(), 0);
    }

    #[test]
    fn scene_reflects_the_highlight_set() {
        let mut view = GraphView::new(chain_graph(), &LaunchOptions::default(), 0.0);
        view.highlight(&["B"]);
        view.advance(0.0);

        let scene = view.scene();

        assert!(scene.node(1).unwrap().highlighted);
        assert!(!scene.node(0).unwrap().highlighted);
    }
}
