use std::collections::BTreeMap;

use chrono::Utc;
use eframe::egui::Vec2;

use crate::network::InteractionGraph;

use super::{Dataset, DatasetEdge, DatasetMeta, DatasetNode, DatasetView, summarize_clusters};

pub fn node_size(degree: usize) -> f32 {
    2.0 + 1.5 * (degree as f32).sqrt()
}

/// Serializable dataset from an assembled graph plus oracle output. Missing
/// positions fall back to the origin and missing communities to `-1`.
pub fn build_dataset(
    graph: &InteractionGraph,
    positions: &[Vec2],
    communities: &[i64],
    view: DatasetView,
    cluster_names: Option<&[String]>,
) -> Dataset {
    let nodes = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let position = positions
                .get(index)
                .copied()
                .filter(|position| position.x.is_finite() && position.y.is_finite())
                .unwrap_or(Vec2::ZERO);
            DatasetNode {
                id: node.id.clone(),
                label: node.label.clone(),
                x: position.x,
                y: position.y,
                size: node_size(node.degree),
                degree: node.degree,
                community: communities.get(index).copied().unwrap_or(-1),
                all_dbs: node.provenance.iter().cloned().collect(),
                has_all_dbs_none: node.has_novelty,
                base_id: None,
                locality: None,
            }
        })
        .collect::<Vec<_>>();

    let edges = graph
        .edges
        .iter()
        .map(|edge| DatasetEdge {
            id: edge.id.clone(),
            source: graph.nodes[edge.source].id.clone(),
            target: graph.nodes[edge.target].id.clone(),
            weight: edge.weight,
            all_dbs: edge.provenance.clone(),
            afmprob: edge.confidence,
        })
        .collect::<Vec<_>>();

    let adjacency = graph
        .neighbors()
        .into_iter()
        .enumerate()
        .map(|(index, list)| {
            let ids = list
                .into_iter()
                .map(|neighbor| graph.nodes[neighbor].id.clone())
                .collect();
            (graph.nodes[index].id.clone(), ids)
        })
        .collect::<BTreeMap<_, _>>();

    let clusters = summarize_clusters(&nodes, cluster_names);

    Dataset {
        meta: DatasetMeta {
            generated_at: Utc::now(),
            order: nodes.len(),
            size: edges.len(),
            view: Some(view),
        },
        nodes,
        edges,
        clusters,
        adjacency,
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::network::{RelationRecord, assemble_graph};

    fn record(source: &str, target: &str, tags: &[&str], confidence: Option<f64>) -> RelationRecord {
        RelationRecord {
            source: source.into(),
            target: target.into(),
            weight: 1.0,
            confidence,
            provenance: tags.iter().map(|tag| tag.to_string()).collect(),
            source_label: None,
            target_label: None,
            source_localities: Vec::new(),
            target_localities: Vec::new(),
        }
    }

    #[test]
    fn dataset_mirrors_graph() {
        let (graph, _) = assemble_graph(
            &[
                record("p1", "p2", &["dbX"], Some(0.9)),
                record("p2", "p3", &["none"], None),
            ],
            None,
            false,
        );
        let positions = [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(f32::NAN, 2.0)];
        let dataset = build_dataset(&graph, &positions, &[0, 0, 1], DatasetView::Network, None);

        assert_eq!(dataset.meta.order, 3);
        assert_eq!(dataset.meta.size, 2);
        assert_eq!(dataset.adjacency["p2"], vec!["p1", "p3"]);
        assert_eq!(dataset.nodes[2].x, 0.0);
        assert_eq!(dataset.nodes[1].size, node_size(2));
        assert!(dataset.nodes[1].has_all_dbs_none);
        assert_eq!(dataset.edges[0].afmprob, Some(0.9));
        assert_eq!(dataset.clusters.len(), 2);
    }
}
