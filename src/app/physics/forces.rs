use eframe::egui::Vec2;

use super::quadtree::{Quadtree, jiggle};
use super::{Body, Link};

pub(super) fn apply_links(bodies: &mut [Body], links: &[Link], distance: f32, alpha: f32) {
    for link in links {
        let (source, target) = (link.source, link.target);
        if source == target || source >= bodies.len() || target >= bodies.len() {
            continue;
        }

        let mut delta = (bodies[target].position + bodies[target].velocity)
            - (bodies[source].position + bodies[source].velocity);
        if delta.length_sq() <= 1e-12 {
            delta = jiggle(source, target);
        }
        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * link.strength);

        bodies[target].velocity -= correction * link.bias;
        bodies[source].velocity += correction * (1.0 - link.bias);
    }
}

pub(super) fn apply_charge(
    bodies: &mut [Body],
    positions: &mut Vec<Vec2>,
    strength: f32,
    theta: f32,
    alpha: f32,
) {
    snapshot_positions(bodies, positions, false);
    let Some(tree) = Quadtree::build(positions) else {
        return;
    };

    let theta_sq = (theta * theta).max(f32::EPSILON);
    for (index, body) in bodies.iter_mut().enumerate() {
        body.velocity += tree.charge_on(index, positions, strength, theta_sq) * alpha;
    }
}

/// Shifts every body so the centroid sits on `center`.
pub(super) fn apply_centering(bodies: &mut [Body], center: Vec2) {
    if bodies.is_empty() {
        return;
    }

    let centroid = bodies
        .iter()
        .fold(Vec2::ZERO, |sum, body| sum + body.position)
        / bodies.len() as f32;
    let shift = centroid - center;
    for body in bodies.iter_mut() {
        body.position -= shift;
    }
}

pub(super) fn apply_collisions(
    bodies: &mut [Body],
    predicted: &mut Vec<Vec2>,
    candidates: &mut Vec<usize>,
    min_distance: f32,
    strength: f32,
) {
    if min_distance <= 0.0 {
        return;
    }

    snapshot_positions(bodies, predicted, true);
    let Some(tree) = Quadtree::build(predicted) else {
        return;
    };

    let min_distance_sq = min_distance * min_distance;
    for index in 0..bodies.len() {
        tree.candidates_within(predicted[index], min_distance, candidates);
        for &other in candidates.iter() {
            if other <= index {
                continue;
            }

            let mut delta = predicted[index] - predicted[other];
            let distance_sq = delta.length_sq();
            if distance_sq >= min_distance_sq {
                continue;
            }
            if distance_sq <= 1e-12 {
                delta = jiggle(index, other);
            }

            let distance = delta.length();
            let push = delta * ((min_distance - distance) / distance * strength * 0.5);
            bodies[index].velocity += push;
            bodies[other].velocity -= push;
        }
    }
}

pub(super) fn apply_axis_bias(bodies: &mut [Body], center: Vec2, strength: f32, alpha: f32) {
    for body in bodies.iter_mut() {
        body.velocity += (center - body.position) * (strength * alpha);
    }
}

fn snapshot_positions(bodies: &[Body], out: &mut Vec<Vec2>, predicted: bool) {
    out.clear();
    out.extend(bodies.iter().map(|body| {
        if predicted {
            body.position + body.velocity
        } else {
            body.position
        }
    }));
}
