use std::collections::HashSet;

use tracing::debug;

use super::graph::{EdgeRecord, InteractionGraph, NodeRecord, edge_key};
use super::parse::{NodeAnnotation, RelationRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssembleStats {
    pub duplicate_edges: usize,
    pub self_loops: usize,
    pub unknown_endpoint: usize,
}

/// Builds an [`InteractionGraph`] from ingested records. When a node table is
/// declared, it fixes the node universe and relations touching undeclared
/// nodes are dropped.
pub struct GraphAssembler {
    directed: bool,
    declared: Option<HashSet<String>>,
    graph: InteractionGraph,
    seen_edges: HashSet<String>,
    stats: AssembleStats,
}

impl GraphAssembler {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            declared: None,
            graph: InteractionGraph {
                directed,
                ..InteractionGraph::default()
            },
            seen_edges: HashSet::new(),
            stats: AssembleStats::default(),
        }
    }

    pub fn declare_nodes(&mut self, nodes: &[NodeAnnotation]) {
        let declared = self.declared.get_or_insert_with(HashSet::new);
        for annotation in nodes {
            declared.insert(annotation.id.clone());
        }

        for annotation in nodes {
            let index = self.ensure_node(&annotation.id);
            self.annotate(index, annotation.label.as_ref(), &annotation.localities);
        }
    }

    fn ensure_node(&mut self, id: &str) -> usize {
        if let Some(&index) = self.graph.index_by_id.get(id) {
            return index;
        }

        let index = self.graph.nodes.len();
        self.graph.nodes.push(NodeRecord::new(id));
        self.graph.index_by_id.insert(id.to_owned(), index);
        index
    }

    fn annotate(&mut self, index: usize, label: Option<&String>, localities: &[String]) {
        let node = &mut self.graph.nodes[index];
        if let Some(label) = label
            && node.label == node.id
        {
            node.label = label.clone();
        }
        for locality in localities {
            if !node.localities.contains(locality) {
                node.localities.push(locality.clone());
            }
        }
    }

    pub fn add_relation(&mut self, record: &RelationRecord) {
        if record.source == record.target {
            self.stats.self_loops += 1;
            return;
        }

        if let Some(declared) = &self.declared
            && (!declared.contains(&record.source) || !declared.contains(&record.target))
        {
            self.stats.unknown_endpoint += 1;
            return;
        }

        let id = edge_key(&record.source, &record.target, self.directed);
        if !self.seen_edges.insert(id.clone()) {
            self.stats.duplicate_edges += 1;
            return;
        }

        let source = self.ensure_node(&record.source);
        let target = self.ensure_node(&record.target);
        self.annotate(source, record.source_label.as_ref(), &record.source_localities);
        self.annotate(target, record.target_label.as_ref(), &record.target_localities);

        self.graph.edges.push(EdgeRecord {
            id,
            source,
            target,
            weight: record.weight,
            confidence: record.confidence,
            provenance: record.provenance.clone(),
        });
    }

    pub fn finish(mut self) -> (InteractionGraph, AssembleStats) {
        self.graph.refresh_node_summaries();
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            stats = ?self.stats,
            "assembled interaction graph"
        );
        (self.graph, self.stats)
    }
}

pub fn assemble_graph(
    records: &[RelationRecord],
    nodes: Option<&[NodeAnnotation]>,
    directed: bool,
) -> (InteractionGraph, AssembleStats) {
    let mut assembler = GraphAssembler::new(directed);
    if let Some(nodes) = nodes {
        assembler.declare_nodes(nodes);
    }
    for record in records {
        assembler.add_relation(record);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, target: &str, tags: &[&str]) -> RelationRecord {
        RelationRecord {
            source: source.into(),
            target: target.into(),
            weight: 1.0,
            confidence: None,
            provenance: tags.iter().map(|tag| tag.to_string()).collect(),
            source_label: None,
            target_label: None,
            source_localities: Vec::new(),
            target_localities: Vec::new(),
        }
    }

    #[test]
    fn undirected_duplicates_collapse_first_wins() {
        let mut first = record("a", "b", &["dbX"]);
        first.weight = 3.0;
        let records = [first, record("b", "a", &["none"])];
        let (graph, stats) = assemble_graph(&records, None, false);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(stats.duplicate_edges, 1);
        assert_eq!(graph.edges[0].weight, 3.0);
        assert!(!graph.edges[0].is_novel());
    }

    #[test]
    fn directed_mode_keeps_both_directions() {
        let records = [record("a", "b", &[]), record("b", "a", &[])];
        let (graph, _) = assemble_graph(&records, None, true);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node("a").map(|node| node.degree), Some(1));
    }

    #[test]
    fn self_loops_are_dropped() {
        let (graph, stats) = assemble_graph(&[record("a", "a", &[])], None, false);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(stats.self_loops, 1);
    }

    #[test]
    fn declared_nodes_restrict_relations() {
        let declared = [
            NodeAnnotation {
                id: "a".into(),
                label: Some("Alpha".into()),
                localities: vec!["Nucleus".into()],
            },
            NodeAnnotation {
                id: "b".into(),
                label: None,
                localities: Vec::new(),
            },
        ];
        let records = [record("a", "b", &[]), record("a", "zzz", &[])];
        let (graph, stats) = assemble_graph(&records, Some(&declared), false);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(stats.unknown_endpoint, 1);
        assert!(
            graph
                .edges
                .iter()
                .all(|edge| edge.source < graph.node_count() && edge.target < graph.node_count())
        );
        assert_eq!(graph.node("a").map(|node| node.label.as_str()), Some("Alpha"));
    }

    #[test]
    fn provenance_union_and_novelty_flag() {
        let records = [
            record("p1", "p2", &["dbX"]),
            record("p2", "p3", &["none"]),
        ];
        let (graph, _) = assemble_graph(&records, None, false);

        let p1 = graph.node("p1").unwrap();
        let p2 = graph.node("p2").unwrap();
        assert!(!p1.has_novelty);
        assert!(p2.has_novelty);
        assert_eq!(
            p2.provenance.iter().cloned().collect::<Vec<_>>(),
            vec!["dbX".to_string(), "none".to_string()]
        );
    }

    #[test]
    fn labels_and_localities_accumulate_in_order() {
        let mut first = record("a", "b", &[]);
        first.source_localities = vec!["Nucleus".into(), "Cytosol".into()];
        let mut second = record("a", "c", &[]);
        second.source_label = Some("Alpha".into());
        second.source_localities = vec!["Cytosol".into(), "Golgi apparatus".into()];

        let (graph, _) = assemble_graph(&[first, second], None, false);
        let a = graph.node("a").unwrap();
        assert_eq!(a.label, "Alpha");
        assert_eq!(a.localities, vec!["Nucleus", "Cytosol", "Golgi apparatus"]);
    }
}
