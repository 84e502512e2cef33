use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, Result};

use super::assemble::{AssembleStats, GraphAssembler};
use super::graph::InteractionGraph;
use super::parse::{ColumnSpec, IngestStats, read_node_table, read_relations};

#[derive(Clone, Debug)]
pub struct IngestOptions {
    pub columns: ColumnSpec,
    pub directed: bool,
    pub limit: Option<usize>,
}

pub struct CollectedGraph {
    pub graph: InteractionGraph,
    pub ingest: IngestStats,
    pub assemble: AssembleStats,
}

/// Reads the relation table (and optional node table) from disk and assembles
/// the interaction graph.
pub fn collect_interaction_graph(
    input: &Path,
    node_table: Option<&Path>,
    options: &IngestOptions,
) -> Result<CollectedGraph> {
    let nodes = match node_table {
        Some(path) => {
            let nodes = read_node_table(BufReader::new(File::open(path)?))?;
            info!(path = %path.display(), nodes = nodes.len(), "read node table");
            Some(nodes)
        }
        None => None,
    };

    let (records, ingest) = read_relations(
        BufReader::new(File::open(input)?),
        &options.columns,
        options.limit,
    )?;
    info!(
        path = %input.display(),
        rows = ingest.data_rows,
        relations = records.len(),
        "read relation table"
    );

    let mut assembler = GraphAssembler::new(options.directed);
    if let Some(nodes) = &nodes {
        assembler.declare_nodes(nodes);
    }
    for record in &records {
        assembler.add_relation(record);
    }
    let (graph, assemble) = assembler.finish();

    if graph.edge_count() == 0 {
        return Err(PipelineError::EmptyGraph);
    }

    Ok(CollectedGraph {
        graph,
        ingest,
        assemble,
    })
}
