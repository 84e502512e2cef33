use std::collections::{BTreeSet, HashSet};
use std::fs;

use eframe::egui::{Vec2, vec2};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use interactome_atlas::dataset::{Dataset, DatasetView, build_dataset, build_locality_dataset};
use interactome_atlas::error::PipelineError;
use interactome_atlas::explore::filter::apply_filters;
use interactome_atlas::explore::index::GraphIndex;
use interactome_atlas::explore::state::FilterParams;
use interactome_atlas::generate::{GenerateOptions, run_generate};
use interactome_atlas::network::{
    ColumnSpec, InteractionGraph, IngestOptions, RelationRecord, assemble_graph, read_relations,
};
use interactome_atlas::oracle::ForceLouvainOracle;
use interactome_atlas::util::is_novelty_tag;

const SCENARIO: &str = "protein1\tprotein2\tallDBs\tafmprob\n\
                        p1\tp2\tdbX\t0.9\n\
                        p2\tp3\tnone\t0.95\n\
                        p1\tp3\tnone\t0.2\n";

fn columns() -> ColumnSpec {
    ColumnSpec {
        confidence: Some("afmprob".into()),
        provenance: Some("allDBs".into()),
        source_locality: Some("loc1".into()),
        target_locality: Some("loc2".into()),
        ..ColumnSpec::new("protein1", "protein2")
    }
}

fn graph_from(table: &str) -> InteractionGraph {
    let (records, _) = read_relations(table.as_bytes(), &columns(), None).unwrap();
    assemble_graph(&records, None, false).0
}

fn network_dataset(graph: &InteractionGraph) -> Dataset {
    let positions = (0..graph.node_count())
        .map(|index| vec2(index as f32 * 50.0, 0.0))
        .collect::<Vec<Vec2>>();
    let communities = vec![0; graph.node_count()];
    build_dataset(graph, &positions, &communities, DatasetView::Network, None)
}

fn visible_edge_pairs(index: &GraphIndex, params: FilterParams) -> BTreeSet<(String, String)> {
    let outcome = apply_filters(index, params, None);
    index
        .edges
        .iter()
        .enumerate()
        .filter(|(edge, _)| outcome.edge_visible(*edge))
        .map(|(_, edge)| {
            let a = index.nodes[edge.source].id.clone();
            let b = index.nodes[edge.target].id.clone();
            if a <= b { (a, b) } else { (b, a) }
        })
        .collect()
}

fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_owned(), b.to_owned())
}

#[test]
fn confidence_floor_scenario() {
    let index = GraphIndex::from_dataset(&network_dataset(&graph_from(SCENARIO)));
    let params = FilterParams {
        confidence_floor: 0.5,
        ..FilterParams::default()
    };

    assert_eq!(
        visible_edge_pairs(&index, params),
        BTreeSet::from([pair("p1", "p2"), pair("p2", "p3")])
    );
    assert_eq!(apply_filters(&index, params, None).visible_novel_edges, 1);
}

#[test]
fn only_novel_scenario() {
    let index = GraphIndex::from_dataset(&network_dataset(&graph_from(SCENARIO)));
    let params = FilterParams {
        only_novel: true,
        ..FilterParams::default()
    };

    assert_eq!(
        visible_edge_pairs(&index, params),
        BTreeSet::from([pair("p1", "p3"), pair("p2", "p3")])
    );
    let outcome = apply_filters(&index, params, None);
    assert_eq!(outcome.visible_nodes, 3);
}

#[test]
fn ingesting_a_table_twice_keeps_edge_cardinality() {
    let reversed = "protein1\tprotein2\n p2\tp1\np3\tp2\np3\tp1\n";
    let (mut records, _) = read_relations(SCENARIO.as_bytes(), &columns(), None).unwrap();
    let single = assemble_graph(&records, None, false).0.edge_count();

    let (again, _) = read_relations(SCENARIO.as_bytes(), &columns(), None).unwrap();
    let (flipped, _) = read_relations(reversed.as_bytes(), &ColumnSpec::new("protein1", "protein2"), None).unwrap();
    records.extend(again);
    records.extend(flipped);

    let (graph, stats) = assemble_graph(&records, None, false);
    assert_eq!(graph.edge_count(), single);
    assert_eq!(stats.duplicate_edges, 6);
}

fn assert_endpoint_integrity(dataset: &Dataset) {
    let ids = dataset.nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
    for edge in &dataset.edges {
        assert!(ids.contains(edge.source.as_str()), "dangling source {}", edge.source);
        assert!(ids.contains(edge.target.as_str()), "dangling target {}", edge.target);
    }
}

fn assert_novelty_consistency(dataset: &Dataset) {
    for node in &dataset.nodes {
        let touches_novel = dataset
            .edges
            .iter()
            .filter(|edge| edge.source == node.id || edge.target == node.id)
            .any(|edge| edge.all_dbs.iter().any(|tag| is_novelty_tag(tag)));
        assert_eq!(node.has_all_dbs_none, touches_novel, "novelty flag of {}", node.id);
    }
}

#[test]
fn generated_datasets_keep_endpoints_and_novelty_consistent() {
    let table = "protein1\tprotein2\tallDBs\tloc1\tloc2\n\
                 a\tb\tdbX\tNucleus\tNucleus;Cytosol\n\
                 b\tc\tnone\tCytosol\t\n\
                 c\td\tdbY|none\t\tGolgi apparatus\n\
                 a\tzz\t\tNucleus\t\n";
    let graph = graph_from(table);
    let network = network_dataset(&graph);
    let locality = build_locality_dataset(&graph, &mut StdRng::seed_from_u64(3));

    for dataset in [&network, &locality] {
        assert_endpoint_integrity(dataset);
        assert_novelty_consistency(dataset);
    }
}

#[test]
fn cross_compartment_edges_survive_locality_routing() {
    let table = "protein1\tprotein2\tallDBs\tloc1\tloc2\n\
                 a\tb\tdbX\tNucleus\tGolgi apparatus\n";
    let locality = build_locality_dataset(&graph_from(table), &mut StdRng::seed_from_u64(11));

    assert_eq!(locality.view(), DatasetView::Locality);
    assert_eq!(locality.edges.len(), 1);
    let edge = &locality.edges[0];
    let endpoints = BTreeSet::from([edge.source.clone(), edge.target.clone()]);
    assert_eq!(
        endpoints,
        BTreeSet::from(["a@Nucleus".to_owned(), "b@Golgi apparatus".to_owned()])
    );
}

fn write_scenario(dir: &std::path::Path) -> std::path::PathBuf {
    let input = dir.join("pairs.tsv");
    let table = format!("# exported interaction table\n# source: test\n{SCENARIO}");
    fs::write(&input, table).unwrap();
    input
}

#[test]
fn generate_writes_both_views() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_scenario(dir.path());
    let options = GenerateOptions {
        input,
        output: dir.path().join("data").join("network.json"),
        locality_output: Some(dir.path().join("data").join("network_locality.json")),
        nodes: None,
        ingest: IngestOptions {
            columns: columns(),
            directed: false,
            limit: None,
        },
        seed: Some(7),
    };

    let report = run_generate(&options, &ForceLouvainOracle::with_iterations(20)).unwrap();
    assert_eq!(report.ingest.metadata_lines, 2);
    assert_eq!(report.network.nodes.len(), 3);

    let network = Dataset::read(&options.output).unwrap();
    assert_eq!(network.view(), DatasetView::Network);
    assert_eq!(network.meta.size, 3);
    assert_eq!(network.adjacency.get("p1").map(Vec::len), Some(2));
    assert!(network.nodes.iter().all(|node| node.x.is_finite() && node.y.is_finite()));

    let locality = Dataset::read(dir.path().join("data/network_locality.json").as_path()).unwrap();
    assert_eq!(locality.view(), DatasetView::Locality);
    assert!(locality.nodes.iter().all(|node| node.id.contains('@')));
}

#[test]
fn generate_fails_when_columns_are_missing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pairs.tsv");
    fs::write(&input, "gene_a\tgene_b\nx\ty\n").unwrap();
    let options = GenerateOptions {
        input,
        output: dir.path().join("network.json"),
        locality_output: None,
        nodes: None,
        ingest: IngestOptions {
            columns: columns(),
            directed: false,
            limit: None,
        },
        seed: None,
    };

    let error = run_generate(&options, &ForceLouvainOracle::default()).unwrap_err();
    assert!(matches!(error, PipelineError::ColumnsNotFound { .. }));
    assert!(error.to_string().contains("gene_a, gene_b"));
    assert!(!options.output.exists());
}

#[test]
fn generate_fails_on_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenerateOptions {
        input: dir.path().join("absent.tsv"),
        output: dir.path().join("network.json"),
        locality_output: None,
        nodes: None,
        ingest: IngestOptions {
            columns: columns(),
            directed: false,
            limit: None,
        },
        seed: None,
    };

    let error = run_generate(&options, &ForceLouvainOracle::default()).unwrap_err();
    assert!(matches!(error, PipelineError::Io(_)));
}

fn random_index(node_count: usize, edges: &[(usize, usize, Option<f64>, bool)]) -> GraphIndex {
    let records = edges
        .iter()
        .map(|&(a, b, confidence, novel)| RelationRecord {
            source: format!("n{}", a % node_count),
            target: format!("n{}", b % node_count),
            weight: 1.0,
            confidence,
            provenance: vec![if novel { "none".into() } else { "dbX".into() }],
            source_label: None,
            target_label: None,
            source_localities: Vec::new(),
            target_localities: Vec::new(),
        })
        .collect::<Vec<_>>();
    let (graph, _) = assemble_graph(&records, None, false);
    GraphIndex::from_dataset(&network_dataset(&graph))
}

fn edge_strategy() -> impl Strategy<Value = Vec<(usize, usize, Option<f64>, bool)>> {
    prop::collection::vec(
        (0usize..24, 0usize..24, prop::option::of(0.0f64..=1.0), any::<bool>()),
        1..60,
    )
}

proptest! {
    #[test]
    fn raising_degree_floor_never_adds_nodes(
        node_count in 2usize..24,
        edges in edge_strategy(),
        low in 0usize..8,
        extra in 0usize..8,
        confidence_floor in 0.0f32..=1.0,
        only_novel in any::<bool>(),
    ) {
        let index = random_index(node_count, &edges);
        let base = FilterParams { degree_floor: low, confidence_floor, only_novel };
        let raised = FilterParams { degree_floor: low + extra, ..base };

        let before = apply_filters(&index, base, None);
        let after = apply_filters(&index, raised, None);
        prop_assert!(after.visible_nodes <= before.visible_nodes);
    }

    #[test]
    fn raising_confidence_floor_never_adds_edges(
        node_count in 2usize..24,
        edges in edge_strategy(),
        degree_floor in 0usize..4,
        low in 0.0f32..=1.0,
        high in 0.0f32..=1.0,
        only_novel in any::<bool>(),
    ) {
        let index = random_index(node_count, &edges);
        let base = FilterParams { degree_floor, confidence_floor: low.min(high), only_novel };
        let raised = FilterParams { confidence_floor: low.max(high), ..base };

        let before = apply_filters(&index, base, None);
        let after = apply_filters(&index, raised, None);
        prop_assert!(after.visible_edges <= before.visible_edges);
    }
}
