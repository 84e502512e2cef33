//! The JSON dataset shared by the generator and the explorer.

mod build;
mod clusters;
mod locality;
pub mod ontology;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use build::{build_dataset, node_size};
pub use clusters::{cluster_size, summarize_clusters};
pub use locality::{UNKNOWN_LOCALITY, build_locality_dataset, instance_id, route_edge};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetView {
    #[default]
    Network,
    Locality,
}

impl DatasetView {
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Locality => "locality",
        }
    }

    /// File name the generator writes for this view inside a data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Network => "network.json",
            Self::Locality => "network_locality.json",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    pub generated_at: DateTime<Utc>,
    /// Node count.
    pub order: usize,
    /// Edge count.
    pub size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<DatasetView>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetNode {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub degree: usize,
    pub community: i64,
    #[serde(rename = "allDBs", default)]
    pub all_dbs: Vec<String>,
    #[serde(rename = "hasAllDBsNone", default)]
    pub has_all_dbs_none: bool,
    #[serde(rename = "baseId", default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(rename = "allDBs", default)]
    pub all_dbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afmprob: Option<f64>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetCluster {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub community: i64,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub meta: DatasetMeta,
    pub nodes: Vec<DatasetNode>,
    pub edges: Vec<DatasetEdge>,
    #[serde(default)]
    pub clusters: Vec<DatasetCluster>,
    #[serde(default)]
    pub adjacency: BTreeMap<String, Vec<String>>,
}

impl Dataset {
    pub fn view(&self) -> DatasetView {
        self.meta.view.unwrap_or_default()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_follow_dataset_format() {
        let raw = r#"{
            "meta": {"generatedAt": "2024-05-01T12:00:00Z", "order": 2, "size": 1, "view": "locality"},
            "nodes": [
                {"id": "a@Nucleus", "label": "A", "x": 1.0, "y": 2.0, "size": 3.5, "degree": 1,
                 "community": 0, "allDBs": ["none"], "hasAllDBsNone": true,
                 "baseId": "a", "locality": "Nucleus"},
                {"id": "b@Nucleus", "label": "B", "x": 0.0, "y": 0.0, "size": 3.5, "degree": 1,
                 "community": 0}
            ],
            "edges": [{"id": "a@Nucleus--b@Nucleus", "source": "a@Nucleus", "target": "b@Nucleus",
                       "allDBs": ["none"], "afmprob": 0.4}],
            "clusters": [],
            "adjacency": {"a@Nucleus": ["b@Nucleus"]}
        }"#;

        let dataset = Dataset::from_reader(raw.as_bytes()).unwrap();
        assert_eq!(dataset.view(), DatasetView::Locality);
        assert_eq!(dataset.nodes[0].base_id.as_deref(), Some("a"));
        assert!(dataset.nodes[0].has_all_dbs_none);
        assert!(dataset.nodes[1].all_dbs.is_empty());
        assert_eq!(dataset.edges[0].weight, 1.0);
        assert_eq!(dataset.edges[0].afmprob, Some(0.4));

        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["meta"]["generatedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(json["nodes"][0]["hasAllDBsNone"], true);
        assert!(json["nodes"][1].get("baseId").is_none());
    }

    #[test]
    fn missing_view_means_network() {
        let raw = r#"{"meta": {"generatedAt": "2024-05-01T12:00:00Z", "order": 0, "size": 0},
                      "nodes": [], "edges": []}"#;
        let dataset = Dataset::from_reader(raw.as_bytes()).unwrap();
        assert_eq!(dataset.view(), DatasetView::Network);
        assert!(dataset.adjacency.is_empty());
    }
}
