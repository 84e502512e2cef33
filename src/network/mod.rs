mod assemble;
mod collect;
mod graph;
mod parse;

pub use assemble::{AssembleStats, GraphAssembler, assemble_graph};
pub use collect::{CollectedGraph, IngestOptions, collect_interaction_graph};
pub use graph::{EdgeRecord, InteractionGraph, NodeRecord, edge_key};
pub use parse::{
    ColumnSpec, IngestStats, NodeAnnotation, RelationRecord, find_column, read_node_table,
    read_relations,
};
