//! The offline pipeline: table -> graph -> oracle -> datasets on disk.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::dataset::{Dataset, DatasetView, build_dataset, build_locality_dataset};
use crate::error::Result;
use crate::network::{AssembleStats, IngestOptions, IngestStats, collect_interaction_graph};
use crate::oracle::GraphOracle;
use crate::util::format_count;

#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub locality_output: Option<PathBuf>,
    pub nodes: Option<PathBuf>,
    pub ingest: IngestOptions,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GenerateReport {
    pub ingest: IngestStats,
    pub assemble: AssembleStats,
    pub network: Dataset,
    pub locality: Option<Dataset>,
}

pub fn run_generate(options: &GenerateOptions, oracle: &dyn GraphOracle) -> Result<GenerateReport> {
    println!("Reading {}", options.input.display());
    let collected = collect_interaction_graph(&options.input, options.nodes.as_deref(), &options.ingest)?;
    let graph = &collected.graph;

    println!(
        "  {} data rows, {} skipped (missing endpoint), {} header/metadata lines",
        format_count(collected.ingest.data_rows),
        format_count(collected.ingest.missing_endpoint),
        collected.ingest.metadata_lines
    );
    println!(
        "  {} nodes, {} edges ({} duplicates, {} self-loops, {} unknown endpoints dropped)",
        format_count(graph.node_count()),
        format_count(graph.edge_count()),
        format_count(collected.assemble.duplicate_edges),
        format_count(collected.assemble.self_loops),
        format_count(collected.assemble.unknown_endpoint)
    );

    println!("Computing layout and communities");
    let positions = oracle.positions(graph);
    let communities = oracle.communities(graph);
    let network = build_dataset(graph, &positions, &communities, DatasetView::Network, None);
    println!("  {} communities", format_count(network.clusters.len()));

    network.write(&options.output)?;
    println!("Wrote {}", options.output.display());
    info!(path = %options.output.display(), nodes = network.meta.order, edges = network.meta.size, "wrote network dataset");

    let locality = match &options.locality_output {
        Some(path) => {
            let mut rng = match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let locality = build_locality_dataset(graph, &mut rng);
            locality.write(path)?;
            println!(
                "Wrote {} ({} instances across {} localities)",
                path.display(),
                format_count(locality.meta.order),
                locality.clusters.len()
            );
            info!(path = %path.display(), nodes = locality.meta.order, "wrote locality dataset");
            Some(locality)
        }
        None => None,
    };

    Ok(GenerateReport {
        ingest: collected.ingest,
        assemble: collected.assemble,
        network,
        locality,
    })
}
