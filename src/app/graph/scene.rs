use std::collections::HashSet;

use eframe::egui::Vec2;

use crate::knowledge::{KnowledgeGraph, NodeKind};

use super::super::physics::LayoutSimulation;
use super::super::search::SearchFilterIndex;
use super::super::selection::SelectionController;
use super::super::viewport::ViewTransform;

const BASE_RADIUS: f32 = 5.0;
const DEGREE_RADIUS: f32 = 2.2;
const MAX_WORLD_RADIUS: f32 = 18.0;
const LABEL_ZOOM: f32 = 1.35;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum NodeEmphasis {
    Selected,
    Neighbor,
    Plain,
    /// A selection is active and the node is outside its ego network.
    Faded,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct SceneNode {
    pub index: usize,
    /// Canvas-local position, after the view transform.
    pub position: Vec2,
    pub radius: f32,
    pub kind: NodeKind,
    pub emphasis: NodeEmphasis,
    pub highlighted: bool,
    pub filtered_out: bool,
    pub hovered: bool,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct SceneEdge {
    pub from: Vec2,
    pub to: Vec2,
    /// Radius of the target node, so arrow heads stop at its rim.
    pub target_radius: f32,
    pub in_ego_network: bool,
    pub faded: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct SceneDescription {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
    pub scale: f32,
    pub is_empty_graph: bool,
}

impl SceneDescription {
    #[cfg(test)]
    pub(in crate::app) fn node(&self, index: usize) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.index == index)
    }

    /// Topmost node whose disc contains `point` (canvas-local).
    pub(in crate::app) fn node_at(&self, point: Vec2) -> Option<usize> {
        self.nodes
            .iter()
            .rev()
            .map(|node| (node.index, (node.position - point).length(), node.radius))
            .filter(|(_, distance, radius)| distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _, _)| index)
    }
}

/// Everything the scene is derived from, borrowed from the owning view.
pub(in crate::app) struct GraphState<'a> {
    pub graph: &'a KnowledgeGraph,
    pub simulation: &'a LayoutSimulation,
    pub transform: ViewTransform,
    pub selection: &'a SelectionController,
    pub search: &'a SearchFilterIndex,
    pub highlighted: &'a HashSet<usize>,
    pub hovered: Option<usize>,
}

pub(in crate::app) fn node_world_radius(degree: usize) -> f32 {
    (BASE_RADIUS + (degree as f32).sqrt() * DEGREE_RADIUS).min(MAX_WORLD_RADIUS)
}

/// Builds the draw list for one frame. Nodes without a simulated position yet are left out.
pub(in crate::app) fn describe_scene(state: &GraphState<'_>) -> SceneDescription {
    let graph = state.graph;
    let transform = state.transform;
    let selected = state.selection.selected();
    let ego = state.selection.ego_network();
    let filtering = state.search.is_filtering();

    let canvas_positions = (0..graph.node_count())
        .map(|index| state.simulation.position(index).map(|world| transform.apply(world)))
        .collect::<Vec<_>>();
    let radii = (0..graph.node_count())
        .map(|index| node_world_radius(graph.degree(index)) * transform.scale.sqrt())
        .collect::<Vec<_>>();

    let edges = graph
        .edges()
        .iter()
        .enumerate()
        .filter_map(|(edge_index, edge)| {
            let from = canvas_positions[edge.source]?;
            let to = canvas_positions[edge.target]?;
            let in_ego_network = ego.is_some_and(|ego| ego.contains_edge(edge_index));
            Some(SceneEdge {
                from,
                to,
                target_radius: radii[edge.target],
                in_ego_network,
                faded: (selected.is_some() && !in_ego_network)
                    || (filtering
                        && !(state.search.matches(edge.source) && state.search.matches(edge.target))),
            })
        })
        .collect();

    let nodes = graph
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let position = canvas_positions[index]?;
            let emphasis = match (selected, ego) {
                (Some(selected), _) if selected == index => NodeEmphasis::Selected,
                (Some(_), Some(ego)) if ego.contains(index) => NodeEmphasis::Neighbor,
                (Some(_), _) => NodeEmphasis::Faded,
                (None, _) => NodeEmphasis::Plain,
            };
            let hovered = state.hovered == Some(index);
            let highlighted = state.highlighted.contains(&index);
            let show_label = hovered
                || highlighted
                || matches!(emphasis, NodeEmphasis::Selected | NodeEmphasis::Neighbor)
                || transform.scale >= LABEL_ZOOM;
            Some(SceneNode {
                index,
                position,
                radius: radii[index],
                kind: node.kind,
                emphasis,
                highlighted,
                filtered_out: filtering && !state.search.matches(index),
                hovered,
                label: show_label.then(|| node.label().to_owned()),
            })
        })
        .collect::<Vec<_>>();

    SceneDescription {
        nodes,
        edges,
        scale: transform.scale,
        is_empty_graph: graph.is_empty(),
    }
}
