//! Boundaries to third-party biology services.

mod annotation;
mod cache;
mod pathway;

use thiserror::Error;

pub use annotation::{Annotation, AnnotationSource, CachedAnnotationSource, MyGeneSource};
pub use cache::{AnnotationCache, CacheEntry, default_cache_path};
pub use pathway::{KeggSource, PathwaySource};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} answered with status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("invalid identifier `{0}`")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn http_client() -> Result<reqwest::blocking::Client, ExternalError> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(15))
        .build()?)
}
