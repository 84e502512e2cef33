//! Read-only lookup structures built once per dataset load.

use std::collections::HashMap;

use eframe::egui::{Rect, Vec2, pos2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::warn;

use crate::dataset::{Dataset, DatasetView};
use crate::util::is_novelty_tag;

use super::camera::bounds_of;

#[derive(Clone, Debug)]
pub struct IndexedNode {
    pub id: String,
    pub label: String,
    pub position: Vec2,
    pub degree: usize,
    pub community: i64,
    pub has_novelty: bool,
    pub provenance: Vec<String>,
    pub locality: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IndexedEdge {
    pub source: usize,
    pub target: usize,
    pub confidence: Option<f32>,
    pub novel: bool,
}

impl IndexedEdge {
    pub fn other(&self, node: usize) -> usize {
        if self.source == node { self.target } else { self.source }
    }
}

#[derive(Clone, Debug)]
pub struct IndexedCluster {
    pub id: String,
    pub label: String,
    pub position: Vec2,
    pub size: f32,
    pub community: i64,
    pub count: usize,
}

pub struct GraphIndex {
    pub view: DatasetView,
    pub nodes: Vec<IndexedNode>,
    pub edges: Vec<IndexedEdge>,
    pub clusters: Vec<IndexedCluster>,
    pub index_by_id: HashMap<String, usize>,
    /// Distinct neighbours per node, sorted.
    pub adjacency: Vec<Vec<usize>>,
    /// Edge indices touching each node.
    pub incident: Vec<Vec<usize>>,
    /// Incident novel edges per node, for heat colouring.
    pub novel_edge_counts: Vec<u32>,
    pub max_novel_edges: u32,
    pub bounds: Rect,
}

impl GraphIndex {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let nodes = dataset
            .nodes
            .iter()
            .map(|node| IndexedNode {
                id: node.id.clone(),
                label: if node.label.is_empty() {
                    node.id.clone()
                } else {
                    node.label.clone()
                },
                position: vec2(node.x, node.y),
                degree: node.degree,
                community: node.community,
                has_novelty: node.has_all_dbs_none,
                provenance: node.all_dbs.clone(),
                locality: node.locality.clone(),
            })
            .collect::<Vec<_>>();

        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut dropped = 0usize;
        let edges = dataset
            .edges
            .iter()
            .filter_map(|edge| {
                let (Some(&source), Some(&target)) =
                    (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
                else {
                    dropped += 1;
                    return None;
                };
                Some(IndexedEdge {
                    source,
                    target,
                    confidence: edge.afmprob.map(|value| value as f32),
                    novel: edge.all_dbs.iter().any(|tag| is_novelty_tag(tag)),
                })
            })
            .collect::<Vec<_>>();
        if dropped > 0 {
            warn!(dropped, "dataset edges reference unknown nodes");
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        let mut incident = vec![Vec::new(); nodes.len()];
        let mut novel_edge_counts = vec![0u32; nodes.len()];
        for (index, edge) in edges.iter().enumerate() {
            for (endpoint, other) in [(edge.source, edge.target), (edge.target, edge.source)] {
                adjacency[endpoint].push(other);
                incident[endpoint].push(index);
                if edge.novel {
                    novel_edge_counts[endpoint] += 1;
                }
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }
        let max_novel_edges = novel_edge_counts.iter().copied().max().unwrap_or(0);

        let clusters = dataset
            .clusters
            .iter()
            .map(|cluster| IndexedCluster {
                id: cluster.id.clone(),
                label: cluster.label.clone(),
                position: vec2(cluster.x, cluster.y),
                size: cluster.size,
                community: cluster.community,
                count: cluster.count,
            })
            .collect();

        let bounds = bounds_of(nodes.iter().map(|node| node.position))
            .unwrap_or_else(|| Rect::from_center_size(pos2(0.0, 0.0), vec2(1.0, 1.0)));

        Self {
            view: dataset.view(),
            nodes,
            edges,
            clusters,
            index_by_id,
            adjacency,
            incident,
            novel_edge_counts,
            max_novel_edges,
            bounds,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_by_id(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Fuzzy matches over labels and ids, best score first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<usize> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut hits = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let label = matcher.fuzzy_match(&node.label, query);
                let id = matcher.fuzzy_match(&node.id, query);
                label.max(id).map(|score| (index, score))
            })
            .collect::<Vec<_>>();

        hits.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| self.nodes[b.0].degree.cmp(&self.nodes[a.0].degree))
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(limit);
        hits.into_iter().map(|(index, _)| index).collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use crate::dataset::{Dataset, DatasetEdge, DatasetMeta, DatasetNode, DatasetView, node_size};

    /// `(id, x, y, degree, novel)` nodes and `(source, target, confidence, tags)` edges.
    pub fn dataset(
        nodes: &[(&str, f32, f32, usize, bool)],
        edges: &[(&str, &str, Option<f64>, &[&str])],
    ) -> Dataset {
        Dataset {
            meta: DatasetMeta {
                generated_at: Utc::now(),
                order: nodes.len(),
                size: edges.len(),
                view: Some(DatasetView::Network),
            },
            nodes: nodes
                .iter()
                .map(|&(id, x, y, degree, novel)| DatasetNode {
                    id: id.into(),
                    label: id.to_uppercase(),
                    x,
                    y,
                    size: node_size(degree),
                    degree,
                    community: 0,
                    all_dbs: if novel { vec!["none".into()] } else { vec!["dbX".into()] },
                    has_all_dbs_none: novel,
                    base_id: None,
                    locality: None,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|&(source, target, confidence, tags)| DatasetEdge {
                    id: format!("{source}--{target}"),
                    source: source.into(),
                    target: target.into(),
                    weight: 1.0,
                    all_dbs: tags.iter().map(|tag| tag.to_string()).collect(),
                    afmprob: confidence,
                })
                .collect(),
            clusters: Vec::new(),
            adjacency: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::dataset;
    use super::*;

    #[test]
    fn index_builds_adjacency_and_heat() {
        let data = dataset(
            &[
                ("p1", 0.0, 0.0, 1, false),
                ("p2", 10.0, 0.0, 2, true),
                ("p3", 20.0, 5.0, 1, true),
            ],
            &[
                ("p1", "p2", Some(0.9), &["dbX"]),
                ("p2", "p3", None, &["none"]),
                ("p3", "ghost", None, &["none"]),
            ],
        );
        let index = GraphIndex::from_dataset(&data);

        assert_eq!(index.edge_count(), 2);
        assert_eq!(index.adjacency[1], vec![0, 2]);
        assert_eq!(index.incident[1], vec![0, 1]);
        assert_eq!(index.novel_edge_counts, vec![0, 1, 1]);
        assert_eq!(index.max_novel_edges, 1);
        assert_eq!(index.bounds.max, pos2(20.0, 5.0));
    }

    #[test]
    fn search_matches_labels_fuzzily() {
        let data = dataset(
            &[("tp53", 0.0, 0.0, 1, false), ("mdm2", 1.0, 0.0, 1, false)],
            &[("tp53", "mdm2", None, &[])],
        );
        let index = GraphIndex::from_dataset(&data);

        assert_eq!(index.search("TP5", 10), vec![0]);
        assert!(index.search("   ", 10).is_empty());
        assert_eq!(index.search("m2", 10), vec![1]);
    }
}
