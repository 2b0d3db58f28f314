mod config;
mod forces;
mod quadtree;

use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};

use crate::knowledge::KnowledgeGraph;
use crate::util::stable_jitter;

pub(in crate::app) use config::ForceConfig;
use forces::{apply_axis_bias, apply_centering, apply_charge, apply_collisions, apply_links};

const INITIAL_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
}

#[derive(Clone, Copy, Debug)]
struct Link {
    source: usize,
    target: usize,
    strength: f32,
    bias: f32,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    candidates: Vec<usize>,
}

/// Iterative force-directed solver advanced one tick per frame.
///
/// Alpha starts at 1 and decays toward `alpha_target`; once it drops below
/// `alpha_min` the solver stops until something reheats it.
pub(in crate::app) struct LayoutSimulation {
    bodies: Vec<Body>,
    links: Vec<Link>,
    config: ForceConfig,
    size: Vec2,
    link_distance: f32,
    alpha: f32,
    alpha_target: f32,
    ticks: u64,
    running: bool,
    scratch: Scratch,
}

impl LayoutSimulation {
    pub(in crate::app) fn new(graph: &KnowledgeGraph, size: Vec2, config: ForceConfig) -> Self {
        let center = size * 0.5;
        let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
        let positions = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                let angle = index as f32 * golden_angle;
                center + vec2(angle.cos(), angle.sin()) * radius + stable_jitter(&node.id)
            })
            .collect();
        let links = graph
            .edges()
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect::<Vec<_>>();

        Self::from_layout(positions, &links, size, config)
    }

    pub(in crate::app) fn from_layout(
        positions: Vec<Vec2>,
        links: &[(usize, usize)],
        size: Vec2,
        config: ForceConfig,
    ) -> Self {
        let bodies = positions
            .into_iter()
            .map(|position| Body {
                position,
                velocity: Vec2::ZERO,
                pin: None,
            })
            .collect::<Vec<_>>();

        let mut link_counts = vec![0usize; bodies.len()];
        for &(source, target) in links {
            if source < bodies.len() && target < bodies.len() && source != target {
                link_counts[source] += 1;
                link_counts[target] += 1;
            }
        }

        let links = links
            .iter()
            .filter(|(source, target)| {
                source != target && *source < bodies.len() && *target < bodies.len()
            })
            .map(|&(source, target)| {
                let source_count = link_counts[source] as f32;
                let target_count = link_counts[target] as f32;
                Link {
                    source,
                    target,
                    strength: 1.0 / source_count.min(target_count),
                    bias: source_count / (source_count + target_count),
                }
            })
            .collect();

        let running = !bodies.is_empty();
        Self {
            bodies,
            links,
            config,
            size,
            link_distance: config.link_distance(size.x),
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
            running,
            scratch: Scratch::default(),
        }
    }

    /// Advances one tick. Returns whether the solver is still running.
    pub(in crate::app) fn tick(&mut self) -> bool {
        if !self.running || self.bodies.is_empty() {
            self.running = false;
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;
        let center = self.center();

        apply_links(&mut self.bodies, &self.links, self.link_distance, alpha);
        apply_charge(
            &mut self.bodies,
            &mut self.scratch.positions,
            self.config.charge_strength,
            self.config.barnes_hut_theta,
            alpha,
        );
        apply_centering(&mut self.bodies, center);
        apply_collisions(
            &mut self.bodies,
            &mut self.scratch.positions,
            &mut self.scratch.candidates,
            self.config.collision_radius,
            self.config.collision_strength,
        );
        apply_axis_bias(&mut self.bodies, center, self.config.axis_strength, alpha);

        let retain = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            if let Some(pin) = body.pin {
                body.position = pin;
                body.velocity = Vec2::ZERO;
            } else {
                body.velocity *= retain;
                body.position += body.velocity;
            }
        }

        self.ticks += 1;
        if self.alpha < self.config.alpha_min {
            self.running = false;
            tracing::debug!(ticks = self.ticks, "layout settled");
        }
        self.running
    }

    pub(in crate::app) fn is_running(&self) -> bool {
        self.running
    }

    pub(in crate::app) fn stop(&mut self) {
        self.running = false;
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(in crate::app) fn len(&self) -> usize {
        self.bodies.len()
    }

    pub(in crate::app) fn center(&self) -> Vec2 {
        self.size * 0.5
    }

    #[cfg(test)]
    pub(in crate::app) fn link_distance(&self) -> f32 {
        self.link_distance
    }

    /// Position of a body, defined only once the solver has ticked at least once.
    pub(in crate::app) fn position(&self, index: usize) -> Option<Vec2> {
        if self.ticks == 0 {
            return None;
        }
        self.bodies.get(index).map(|body| body.position)
    }

    pub(in crate::app) fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(in crate::app) fn resize(&mut self, size: Vec2) {
        self.size = size;
        self.link_distance = self.config.link_distance(size.x);
        self.reheat(self.config.reheat_alpha);
    }

    /// Raises alpha to at least `alpha` and restarts the solver.
    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
        self.running = !self.bodies.is_empty();
    }

    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = Some(position);
        }
    }

    pub(in crate::app) fn unpin(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = None;
        }
    }

    #[cfg(test)]
    pub(in crate::app) fn pinned(&self, index: usize) -> Option<Vec2> {
        self.bodies.get(index).and_then(|body| body.pin)
    }

    pub(in crate::app) fn drag_start(&mut self, index: usize) {
        let Some(body) = self.bodies.get_mut(index) else {
            return;
        };
        body.pin = Some(body.position);
        self.alpha_target = self.config.reheat_alpha;
        self.running = true;
    }

    pub(in crate::app) fn drag_move(&mut self, index: usize, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = Some(position);
            body.position = position;
        }
    }

    pub(in crate::app) fn drag_end(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            if let Some(pin) = body.pin.take() {
                body.position = pin;
                body.velocity = Vec2::ZERO;
            }
        }
        self.alpha_target = 0.0;
    }

    /// Keeps every body inside `[min, max]` on both axes.
    pub(in crate::app) fn clamp_positions(&mut self, min: Vec2, max: Vec2) {
        for body in &mut self.bodies {
            body.position = body.position.clamp(min, max);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::knowledge::fixtures::{chain_graph, graph_from};

    fn settle(simulation: &mut LayoutSimulation, max_ticks: usize) {
        for _ in 0..max_ticks {
            if !simulation.tick() {
                break;
            }
        }
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let graph = graph_from(json!({"nodes": [], "edges": []}));
        let mut simulation = LayoutSimulation::new(&graph, vec2(800.0, 600.0), ForceConfig::default());

        assert!(!simulation.is_running());
        assert!(!simulation.tick());
        assert_eq!(simulation.ticks(), 0);
    }

    #[test]
    fn positions_are_undefined_until_the_first_tick() {
        let graph = chain_graph();
        let mut simulation = LayoutSimulation::new(&graph, vec2(800.0, 600.0), ForceConfig::default());

        assert_eq!(simulation.position(0), None);
        simulation.tick();
        assert!(simulation.position(0).is_some());
        assert_eq!(simulation.position(99), None);
    }

    #[test]
    fn layout_settles_near_the_center_and_stops() {
        let graph = chain_graph();
        let size = vec2(1200.0, 800.0);
        let mut simulation = LayoutSimulation::new(&graph, size, ForceConfig::default());

        settle(&mut simulation, 1_000);

        assert!(!simulation.is_running());
        assert!(simulation.alpha() < ForceConfig::default().alpha_min);
        let centroid = simulation
            .bodies()
            .iter()
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / simulation.len() as f32;
        assert!((centroid - size * 0.5).length() < 5.0, "centroid {centroid:?}");
    }

    #[test]
    fn bodies_do_not_overlap_after_settling() {
        let nodes = (0..30)
            .map(|index| json!({"id": format!("n{index}")}))
            .collect::<Vec<_>>();
        let graph = graph_from(json!({"nodes": nodes, "edges": []}));
        let mut simulation = LayoutSimulation::new(&graph, vec2(1200.0, 800.0), ForceConfig::default());

        settle(&mut simulation, 1_000);

        let bodies = simulation.bodies();
        for first in 0..bodies.len() {
            for second in (first + 1)..bodies.len() {
                let distance = (bodies[first].position - bodies[second].position).length();
                assert!(distance > 10.0, "{first} and {second} are {distance} apart");
            }
        }
    }

    #[test]
    fn linked_bodies_end_up_closer_than_unlinked_ones() {
        let graph = graph_from(json!({
            "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
            "edges": [{"source": "a", "target": "b"}]
        }));
        let mut simulation = LayoutSimulation::new(&graph, vec2(1200.0, 800.0), ForceConfig::default());

        settle(&mut simulation, 1_000);

        let bodies = simulation.bodies();
        let linked = (bodies[0].position - bodies[1].position).length();
        let unlinked = (bodies[0].position - bodies[2].position).length();
        assert!(linked < unlinked, "linked {linked} vs unlinked {unlinked}");
    }

    #[test]
    fn pinned_body_holds_its_pin_every_tick() {
        let graph = chain_graph();
        let mut simulation = LayoutSimulation::new(&graph, vec2(800.0, 600.0), ForceConfig::default());
        let pin = vec2(42.0, 24.0);

        simulation.pin(1, pin);
        for _ in 0..20 {
            simulation.tick();
            assert_eq!(simulation.position(1), Some(pin));
        }

        simulation.unpin(1);
        assert_eq!(simulation.pinned(1), None);
    }

    #[test]
    fn drag_sequence_tracks_pointer_and_releases_pin() {
        let graph = chain_graph();
        let mut simulation = LayoutSimulation::new(&graph, vec2(800.0, 600.0), ForceConfig::default());
        settle(&mut simulation, 1_000);
        assert!(!simulation.is_running());

        let start = simulation.position(0).unwrap();
        simulation.drag_start(0);
        assert_eq!(simulation.pinned(0), Some(start));
        assert!(simulation.is_running());

        let target = start + vec2(120.0, -45.0);
        simulation.drag_move(0, target);
        simulation.tick();
        assert_eq!(simulation.position(0), Some(target));
        assert!(simulation.alpha() > ForceConfig::default().alpha_min);

        simulation.drag_end(0);
        assert_eq!(simulation.pinned(0), None);
        assert_eq!(simulation.position(0), Some(target));
    }

    #[test]
    fn resize_moves_the_center_and_reheats() {
        let graph = chain_graph();
        let mut simulation = LayoutSimulation::new(&graph, vec2(1200.0, 800.0), ForceConfig::default());
        settle(&mut simulation, 1_000);
        assert!(!simulation.is_running());

        simulation.resize(vec2(600.0, 400.0));

        assert_eq!(simulation.center(), vec2(300.0, 200.0));
        assert_eq!(simulation.link_distance(), 30.0);
        assert!(simulation.is_running());
        assert!(simulation.alpha() >= 0.3);
    }

    #[test]
    fn clamp_keeps_bodies_in_bounds() {
        let mut simulation = LayoutSimulation::from_layout(
            vec![vec2(-50.0, 10.0), vec2(500.0, 900.0)],
            &[(0, 1)],
            vec2(300.0, 300.0),
            ForceConfig::local_graph(),
        );

        simulation.clamp_positions(vec2(10.0, 10.0), vec2(290.0, 290.0));

        assert_eq!(simulation.bodies()[0].position, vec2(10.0, 10.0));
        assert_eq!(simulation.bodies()[1].position, vec2(290.0, 290.0));
    }
}
