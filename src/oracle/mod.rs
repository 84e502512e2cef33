//! Layout and community assignment.
//!
//! The pipeline only needs positions and community ids, so both sit behind
//! [`GraphOracle`]; [`ForceLouvainOracle`] is the built-in implementation.

mod community;
mod layout;
mod quadtree;

use eframe::egui::Vec2;
use tracing::debug;

use crate::network::InteractionGraph;

pub use community::louvain;
pub use layout::force_layout;

pub trait GraphOracle {
    /// One finite position per node, in node index order.
    fn positions(&self, graph: &InteractionGraph) -> Vec<Vec2>;

    /// One community id per node, in node index order. `-1` means unassigned.
    fn communities(&self, graph: &InteractionGraph) -> Vec<i64>;
}

#[derive(Clone, Copy, Debug)]
pub struct ForceLouvainOracle {
    pub iterations: usize,
    pub max_levels: usize,
}

impl Default for ForceLouvainOracle {
    fn default() -> Self {
        Self {
            iterations: 120,
            max_levels: 6,
        }
    }
}

impl ForceLouvainOracle {
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }
}

impl GraphOracle for ForceLouvainOracle {
    fn positions(&self, graph: &InteractionGraph) -> Vec<Vec2> {
        let ids = graph
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        let radii = graph
            .nodes
            .iter()
            .map(|node| 4.0 + 1.5 * (node.degree as f32).sqrt())
            .collect::<Vec<_>>();
        let edges = graph
            .edges
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect::<Vec<_>>();

        debug!(nodes = ids.len(), iterations = self.iterations, "running force layout");
        force_layout(&ids, &edges, &radii, self.iterations)
    }

    fn communities(&self, graph: &InteractionGraph) -> Vec<i64> {
        let edges = graph
            .edges
            .iter()
            .map(|edge| {
                let weight = if edge.weight > 0.0 { edge.weight } else { 1.0 };
                (edge.source, edge.target, weight)
            })
            .collect::<Vec<_>>();

        louvain(graph.node_count(), &edges, self.max_levels)
            .into_iter()
            .map(|community| community as i64)
            .collect()
    }
}
