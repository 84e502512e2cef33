//! Degree, confidence and novelty predicates, re-evaluated over the whole
//! graph on every parameter change.

use super::index::{GraphIndex, IndexedEdge};
use super::state::FilterParams;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborCounts {
    pub neighbor_count: usize,
    pub novel_neighbor_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOutcome {
    pub node_hidden: Vec<bool>,
    pub edge_hidden: Vec<bool>,
    pub visible_nodes: usize,
    pub visible_edges: usize,
    pub visible_novel_edges: usize,
    pub focus: Option<NeighborCounts>,
}

impl FilterOutcome {
    pub fn node_visible(&self, node: usize) -> bool {
        !self.node_hidden.get(node).copied().unwrap_or(true)
    }

    pub fn edge_visible(&self, edge: usize) -> bool {
        !self.edge_hidden.get(edge).copied().unwrap_or(true)
    }
}

pub(super) fn edge_passes(edge: &IndexedEdge, params: &FilterParams) -> bool {
    let confident = edge
        .confidence
        .is_none_or(|confidence| confidence >= params.confidence_floor);
    confident && (!params.only_novel || edge.novel)
}

pub fn apply_filters(index: &GraphIndex, params: FilterParams, focused: Option<usize>) -> FilterOutcome {
    let params = params.sanitized();

    let node_hidden = index
        .nodes
        .iter()
        .map(|node| node.degree < params.degree_floor || (params.only_novel && !node.has_novelty))
        .collect::<Vec<_>>();

    let edge_hidden = index
        .edges
        .iter()
        .map(|edge| !edge_passes(edge, &params) || node_hidden[edge.source] || node_hidden[edge.target])
        .collect::<Vec<_>>();

    let visible_nodes = node_hidden.iter().filter(|hidden| !**hidden).count();
    let (visible_edges, visible_novel_edges) = index
        .edges
        .iter()
        .zip(&edge_hidden)
        .filter(|(_, hidden)| !**hidden)
        .fold((0, 0), |(all, novel), (edge, _)| (all + 1, novel + usize::from(edge.novel)));

    let focus = focused
        .filter(|&node| node < index.node_count())
        .map(|node| {
            let mut counts = NeighborCounts::default();
            for &neighbor in &index.adjacency[node] {
                if node_hidden[neighbor] {
                    continue;
                }
                counts.neighbor_count += 1;

                // The focused node is always drawn, so only the far end's
                // visibility matters here.
                let novel_link = index.incident[node].iter().any(|&edge_index| {
                    let edge = &index.edges[edge_index];
                    edge.other(node) == neighbor && edge.novel && edge_passes(edge, &params)
                });
                if novel_link {
                    counts.novel_neighbor_count += 1;
                }
            }
            counts
        });

    FilterOutcome {
        node_hidden,
        edge_hidden,
        visible_nodes,
        visible_edges,
        visible_novel_edges,
        focus,
    }
}
