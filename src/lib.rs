//! Offline layout and partition pipeline for protein interaction networks,
//! and the interactive explorer that reads its output.

pub mod config;
pub mod dataset;
pub mod error;
pub mod explore;
pub mod external;
pub mod generate;
pub mod network;
pub mod oracle;
pub mod util;
