use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

use super::quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.9;

/// Force-directed placement with Barnes-Hut repulsion, linear springs and a
/// cooling temperature cap on per-iteration displacement.
pub fn force_layout(
    node_ids: &[String],
    edges: &[(usize, usize)],
    node_radii: &[f32],
    iterations: usize,
) -> Vec<Vec2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }

    let base_radius = (n as f32).sqrt() * 60.0;
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let angle = (index as f32 / n as f32) * TAU;
            let (jx, jy) = stable_pair(id);
            let jitter = vec2(jx, jy) * base_radius * 0.8;
            let radial = vec2(angle.cos(), angle.sin()) * base_radius * 0.4;
            radial + jitter
        })
        .collect::<Vec<_>>();

    if n == 1 {
        return positions;
    }

    let area = (base_radius * 2.4).powi(2);
    let k = (area / n as f32).sqrt().max(24.0);
    let mut temperature = (k * 5.5).max(140.0);
    let mut disp = vec![Vec2::ZERO; n];

    for _ in 0..iterations {
        disp.fill(Vec2::ZERO);

        if let Some(tree) = QuadNode::build(&positions) {
            for (index, force) in disp.iter_mut().enumerate() {
                tree.accumulate_repulsion(index, &positions, k * k, BARNES_HUT_THETA, force);
            }
        }

        for &(from, to) in edges {
            if from >= n || to >= n || from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;

            let rf = node_radii.get(from).copied().unwrap_or(4.0);
            let rt = node_radii.get(to).copied().unwrap_or(4.0);
            let ideal_length = k + (rf + rt) * 2.0;
            let force = (distance - ideal_length) * 0.18;

            disp[from] -= direction * force;
            disp[to] += direction * force;
        }

        for (force, position) in disp.iter_mut().zip(&positions) {
            *force -= *position * 0.0012;
        }

        for (position, d) in positions.iter_mut().zip(&disp) {
            let length = d.length();
            if length > 0.0 {
                *position += *d / length * length.min(temperature) * 0.92;
            }
        }

        temperature *= 0.965;
        if temperature < 0.55 {
            break;
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("n{i}")).collect()
    }

    #[test]
    fn connected_pair_ends_closer_than_unconnected() {
        let node_ids = ids(3);
        let positions = force_layout(&node_ids, &[(0, 1)], &[4.0; 3], 200);

        let linked = (positions[0] - positions[1]).length();
        let loose = (positions[0] - positions[2])
            .length()
            .min((positions[1] - positions[2]).length());
        assert!(linked < loose, "linked {linked} loose {loose}");
    }

    #[test]
    fn layout_is_deterministic_and_finite() {
        let node_ids = ids(30);
        let edges = (1..30).map(|i| (i - 1, i)).collect::<Vec<_>>();
        let first = force_layout(&node_ids, &edges, &[4.0; 30], 60);
        let second = force_layout(&node_ids, &edges, &[4.0; 30], 60);

        assert_eq!(first, second);
        assert!(first.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn trivial_inputs() {
        assert!(force_layout(&[], &[], &[], 10).is_empty());
        assert_eq!(force_layout(&ids(1), &[], &[], 10).len(), 1);
    }
}
