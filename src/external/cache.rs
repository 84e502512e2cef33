use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ExternalError;
use super::annotation::Annotation;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: DateTime<Utc>,
    /// `None` records a negative answer so it is not asked again.
    pub annotation: Option<Annotation>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: BTreeMap<String, CacheEntry>,
}

/// Annotation answers keyed by lowercase label, valid for `ttl`.
#[derive(Clone, Debug)]
pub struct AnnotationCache {
    entries: BTreeMap<String, CacheEntry>,
    ttl: Duration,
}

pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("interactome-atlas").join("annotations.json"))
}

fn cache_key(label: &str) -> String {
    label.trim().to_lowercase()
}

impl AnnotationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl,
        }
    }

    /// Loads the cache file. A missing or unreadable file yields an empty cache.
    pub fn load(path: &Path, ttl: Duration) -> Self {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Self::new(ttl),
            Err(error) => {
                warn!(path = %path.display(), %error, "cannot open annotation cache");
                return Self::new(ttl);
            }
        };

        match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
            Ok(contents) => Self {
                entries: contents.entries,
                ttl,
            },
            Err(error) => {
                warn!(path = %path.display(), %error, "discarding corrupt annotation cache");
                Self::new(ttl)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ExternalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(
            &mut writer,
            &CacheFile {
                entries: self.entries.clone(),
            },
        )?;
        writer.flush()?;
        Ok(())
    }

    pub fn get(&self, label: &str, now: DateTime<Utc>) -> Option<&CacheEntry> {
        self.entries
            .get(&cache_key(label))
            .filter(|entry| now - entry.stored_at < self.ttl)
    }

    pub fn insert(&mut self, label: &str, annotation: Option<Annotation>, now: DateTime<Utc>) {
        self.entries.insert(
            cache_key(label),
            CacheEntry {
                stored_at: now,
                annotation,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
