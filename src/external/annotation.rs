use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cache::AnnotationCache;
use super::{ExternalError, http_client};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Annotation {
    pub fn text(&self) -> String {
        match (&self.name, &self.summary) {
            (Some(name), Some(summary)) => format!("{name}\n\n{summary}"),
            (Some(name), None) => name.clone(),
            (None, Some(summary)) => summary.clone(),
            (None, None) => self.symbol.clone(),
        }
    }
}

/// Looks up a free-text description for a protein by its display label.
/// `Ok(None)` means the service knows nothing about it.
pub trait AnnotationSource: Send + Sync {
    fn lookup(&self, label: &str) -> Result<Option<Annotation>, ExternalError>;
}

pub struct MyGeneSource {
    endpoint: String,
    species: String,
}

impl Default for MyGeneSource {
    fn default() -> Self {
        Self {
            endpoint: "https://mygene.info/v3/query".to_owned(),
            species: "human".to_owned(),
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<QueryHit>,
}

#[derive(Deserialize)]
struct QueryHit {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl AnnotationSource for MyGeneSource {
    fn lookup(&self, label: &str) -> Result<Option<Annotation>, ExternalError> {
        let response = http_client()?
            .get(&self.endpoint)
            .query(&[
                ("q", format!("symbol:{label}")),
                ("species", self.species.clone()),
                ("fields", "symbol,name,summary".to_owned()),
                ("size", "1".to_owned()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalError::Status {
                service: "mygene",
                status: status.as_u16(),
            });
        }

        let body = response.json::<QueryResponse>()?;
        Ok(body.hits.into_iter().next().map(|hit| Annotation {
            symbol: hit.symbol.unwrap_or_else(|| label.to_owned()),
            name: hit.name,
            summary: hit.summary,
            fetched_at: Utc::now(),
        }))
    }
}

/// Serves fresh cache entries and writes new answers through to disk.
pub struct CachedAnnotationSource<S> {
    inner: S,
    cache: Mutex<AnnotationCache>,
    path: Option<PathBuf>,
}

impl<S: AnnotationSource> CachedAnnotationSource<S> {
    pub fn new(inner: S, path: Option<PathBuf>, ttl: Duration) -> Self {
        let cache = match &path {
            Some(path) => AnnotationCache::load(path, ttl),
            None => AnnotationCache::new(ttl),
        };
        Self {
            inner,
            cache: Mutex::new(cache),
            path,
        }
    }
}

impl<S: AnnotationSource> AnnotationSource for CachedAnnotationSource<S> {
    fn lookup(&self, label: &str) -> Result<Option<Annotation>, ExternalError> {
        let now = Utc::now();
        if let Ok(cache) = self.cache.lock()
            && let Some(entry) = cache.get(label, now)
        {
            debug!(label, "annotation cache hit");
            return Ok(entry.annotation.clone());
        }

        let annotation = self.inner.lookup(label)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(label, annotation.clone(), now);
            if let Some(path) = &self.path
                && let Err(error) = cache.save(path)
            {
                warn!(path = %path.display(), %error, "failed to persist annotation cache");
            }
        }
        Ok(annotation)
    }
}
