use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::knowledge::{EgoNetwork, KnowledgeGraph, NodeKind};

use super::physics::{ForceConfig, LayoutSimulation};

pub(in crate::app) const PIN_RELEASE_SECS: f64 = 1.0;
pub(in crate::app) const RUN_BUDGET_SECS: f64 = 8.0;
pub(in crate::app) const RING_RADIUS: f32 = 90.0;
pub(in crate::app) const NODE_RADIUS: f32 = 10.0;

#[derive(Clone, Debug)]
pub(in crate::app) struct EgoNode {
    pub graph_index: usize,
    pub label: String,
    pub kind: NodeKind,
    pub is_center: bool,
}

/// Short-lived layout of one node's direct neighborhood inside a fixed panel.
///
/// Node data is cloned out of the main graph; nothing here writes back to it.
pub(in crate::app) struct EgoGraphSimulation {
    nodes: Vec<EgoNode>,
    links: Vec<(usize, usize)>,
    size: Vec2,
    simulation: Option<LayoutSimulation>,
    self_loop: bool,
    started_at: f64,
    pin_released: bool,
}

impl EgoGraphSimulation {
    pub(in crate::app) fn new(
        graph: &KnowledgeGraph,
        center: usize,
        ego: &EgoNetwork,
        size: Vec2,
        now: f64,
    ) -> Self {
        let mut nodes = Vec::new();
        if let Some(node) = graph.node(center) {
            nodes.push(EgoNode {
                graph_index: center,
                label: node.label().to_owned(),
                kind: node.kind,
                is_center: true,
            });
        }

        let neighbors = ego
            .neighbors()
            .into_iter()
            .filter(|&index| index != center)
            .collect::<Vec<_>>();
        for &index in &neighbors {
            if let Some(node) = graph.node(index) {
                nodes.push(EgoNode {
                    graph_index: index,
                    label: node.label().to_owned(),
                    kind: node.kind,
                    is_center: false,
                });
            }
        }

        let local_index = |graph_index: usize| {
            nodes
                .iter()
                .position(|node| node.graph_index == graph_index)
        };
        let mut links = Vec::new();
        for connection in &ego.incoming {
            if let (Some(source), Some(target)) = (local_index(connection.node), local_index(center))
                && source != target
            {
                links.push((source, target));
            }
        }
        for connection in &ego.outgoing {
            if let (Some(source), Some(target)) = (local_index(center), local_index(connection.node))
                && source != target
            {
                links.push((source, target));
            }
        }

        let self_loop = ego
            .incoming
            .iter()
            .chain(&ego.outgoing)
            .any(|connection| connection.node == center);

        let panel_center = size * 0.5;
        let neighbor_count = nodes.len().saturating_sub(1);
        let simulation = (neighbor_count > 0).then(|| {
            let positions = (0..nodes.len())
                .map(|local| {
                    if local == 0 {
                        return panel_center;
                    }
                    let angle = (local - 1) as f32 * TAU / neighbor_count as f32;
                    panel_center + vec2(angle.cos(), angle.sin()) * RING_RADIUS
                })
                .collect();
            let mut simulation =
                LayoutSimulation::from_layout(positions, &links, size, ForceConfig::local_graph());
            simulation.pin(0, panel_center);
            simulation
        });

        Self {
            nodes,
            links,
            size,
            simulation,
            self_loop,
            started_at: now,
            pin_released: false,
        }
    }

    /// Advances one tick; enforces the pin release delay and the run budget.
    pub(in crate::app) fn tick(&mut self, now: f64) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        if !simulation.is_running() {
            return false;
        }

        let elapsed = now - self.started_at;
        if elapsed >= RUN_BUDGET_SECS {
            tracing::debug!(ticks = simulation.ticks(), "local graph run budget spent");
            simulation.stop();
            return false;
        }
        if !self.pin_released && elapsed >= PIN_RELEASE_SECS {
            simulation.unpin(0);
            self.pin_released = true;
        }

        let running = simulation.tick();
        let margin = vec2(NODE_RADIUS, NODE_RADIUS);
        simulation.clamp_positions(margin, self.size - margin);
        running
    }

    pub(in crate::app) fn stop(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.stop();
        }
    }

    pub(in crate::app) fn is_running(&self) -> bool {
        self.simulation
            .as_ref()
            .is_some_and(LayoutSimulation::is_running)
    }

    /// False when the node has no edges at all. A node with only a self-loop
    /// has connections but no solver.
    pub(in crate::app) fn has_connections(&self) -> bool {
        self.simulation.is_some() || self.self_loop
    }

    pub(in crate::app) fn has_self_loop(&self) -> bool {
        self.self_loop
    }

    #[cfg(test)]
    pub(in crate::app) fn center_index(&self) -> Option<usize> {
        self.nodes.first().map(|node| node.graph_index)
    }

    pub(in crate::app) fn nodes(&self) -> &[EgoNode] {
        &self.nodes
    }

    pub(in crate::app) fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    /// Panel-space position of each node; the lone center sits in the middle.
    pub(in crate::app) fn positions(&self) -> Vec<Vec2> {
        match &self.simulation {
            Some(simulation) => simulation.bodies().iter().map(|body| body.position).collect(),
            None => self.nodes.iter().map(|_| self.size * 0.5).collect(),
        }
    }

    /// Graph index of the node under `point` (panel space), if any.
    pub(in crate::app) fn hit_test(&self, point: Vec2) -> Option<usize> {
        self.positions()
            .into_iter()
            .zip(self.nodes.iter())
            .map(|(position, node)| ((position - point).length(), node.graph_index))
            .filter(|(distance, _)| *distance <= NODE_RADIUS + 2.0)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, graph_index)| graph_index)
    }
}
