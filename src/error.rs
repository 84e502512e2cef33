//! Error types for the offline pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(
        "could not find source column `{source_col}` and target column `{target_col}`; columns present: [{}]",
        .available.join(", ")
    )]
    ColumnsNotFound {
        source_col: String,
        target_col: String,
        available: Vec<String>,
    },

    #[error("node table has no `{0}` column")]
    NodeColumnMissing(String),

    #[error("input contained no usable relations")]
    EmptyGraph,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
