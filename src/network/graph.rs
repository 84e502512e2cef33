use std::collections::{BTreeSet, HashMap};

use crate::util::is_novelty_tag;

#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    pub degree: usize,
    pub provenance: BTreeSet<String>,
    pub has_novelty: bool,
    pub localities: Vec<String>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            degree: 0,
            provenance: BTreeSet::new(),
            has_novelty: false,
            localities: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EdgeRecord {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    pub confidence: Option<f64>,
    pub provenance: Vec<String>,
}

impl EdgeRecord {
    pub fn is_novel(&self) -> bool {
        self.provenance.iter().any(|tag| is_novelty_tag(tag))
    }
}

#[derive(Clone, Debug, Default)]
pub struct InteractionGraph {
    pub directed: bool,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub index_by_id: HashMap<String, usize>,
}

/// Deterministic edge id. Undirected ids order the endpoints so `(a, b)` and
/// `(b, a)` collapse to the same key.
pub fn edge_key(source: &str, target: &str, directed: bool) -> String {
    if directed {
        format!("{source}->{target}")
    } else if source <= target {
        format!("{source}--{target}")
    } else {
        format!("{target}--{source}")
    }
}

impl InteractionGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    /// Symmetric neighbour lists, regardless of directedness.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut neighbors = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            neighbors[edge.source].push(edge.target);
            neighbors[edge.target].push(edge.source);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        neighbors
    }

    /// Recomputes degree, provenance union and the novelty flag from the
    /// current edge set.
    pub fn refresh_node_summaries(&mut self) {
        let neighbors = self.neighbors();
        for (node, list) in self.nodes.iter_mut().zip(&neighbors) {
            node.degree = list.len();
            node.provenance.clear();
            node.has_novelty = false;
        }

        for edge in &self.edges {
            for endpoint in [edge.source, edge.target] {
                let node = &mut self.nodes[endpoint];
                node.provenance.extend(edge.provenance.iter().cloned());
                node.has_novelty |= edge.is_novel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undirected_edge_key_ignores_order() {
        assert_eq!(edge_key("b", "a", false), edge_key("a", "b", false));
        assert_eq!(edge_key("a", "b", false), "a--b");
    }

    #[test]
    fn directed_edge_key_keeps_order() {
        assert_ne!(edge_key("b", "a", true), edge_key("a", "b", true));
        assert_eq!(edge_key("b", "a", true), "b->a");
    }
}
