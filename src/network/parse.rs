use std::io::BufRead;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::util::{normalize_key, split_list};

/// Column names requested by the caller. Only `source` and `target` are
/// required; the rest are looked up when given.
#[derive(Clone, Debug, Default)]
pub struct ColumnSpec {
    pub source: String,
    pub target: String,
    pub weight: Option<String>,
    pub confidence: Option<String>,
    pub provenance: Option<String>,
    pub source_label: Option<String>,
    pub target_label: Option<String>,
    pub source_locality: Option<String>,
    pub target_locality: Option<String>,
}

impl ColumnSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationRecord {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub confidence: Option<f64>,
    pub provenance: Vec<String>,
    pub source_label: Option<String>,
    pub target_label: Option<String>,
    pub source_localities: Vec<String>,
    pub target_localities: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeAnnotation {
    pub id: String,
    pub label: Option<String>,
    pub localities: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub metadata_lines: usize,
    pub data_rows: usize,
    pub missing_endpoint: usize,
    pub coerced_weight: usize,
    pub dropped_confidence: usize,
}

#[derive(Clone, Copy, Debug)]
struct ResolvedColumns {
    source: usize,
    target: usize,
    weight: Option<usize>,
    confidence: Option<usize>,
    provenance: Option<usize>,
    source_label: Option<usize>,
    target_label: Option<usize>,
    source_locality: Option<usize>,
    target_locality: Option<usize>,
}

/// Finds `wanted` among header cells: an exact normalized match wins,
/// otherwise the first cell containing the normalized name.
pub fn find_column(cells: &[&str], wanted: &str) -> Option<usize> {
    let wanted = normalize_key(wanted);
    if wanted.is_empty() {
        return None;
    }

    let normalized = cells
        .iter()
        .map(|cell| normalize_key(cell))
        .collect::<Vec<_>>();

    normalized
        .iter()
        .position(|cell| *cell == wanted)
        .or_else(|| normalized.iter().position(|cell| cell.contains(&wanted)))
}

fn resolve_header(cells: &[&str], spec: &ColumnSpec) -> Option<ResolvedColumns> {
    let source = find_column(cells, &spec.source)?;
    let target = find_column(cells, &spec.target)?;
    if source == target {
        return None;
    }

    let optional = |name: &Option<String>| name.as_deref().and_then(|name| find_column(cells, name));

    Some(ResolvedColumns {
        source,
        target,
        weight: optional(&spec.weight),
        confidence: optional(&spec.confidence),
        provenance: optional(&spec.provenance),
        source_label: optional(&spec.source_label),
        target_label: optional(&spec.target_label),
        source_locality: optional(&spec.source_locality),
        target_locality: optional(&spec.target_locality),
    })
}

fn next_line<R: BufRead>(reader: &mut R, buffer: &mut Vec<u8>) -> Result<Option<String>> {
    buffer.clear();
    if reader.read_until(b'\n', buffer)? == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(buffer);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn cell<'a>(cells: &[&'a str], index: Option<usize>) -> Option<&'a str> {
    index
        .and_then(|index| cells.get(index))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Reads a tab-separated relation table. Lines before the first line that
/// resolves both endpoint columns are treated as metadata.
pub fn read_relations<R: BufRead>(
    mut reader: R,
    spec: &ColumnSpec,
    limit: Option<usize>,
) -> Result<(Vec<RelationRecord>, IngestStats)> {
    let mut stats = IngestStats::default();
    let mut buffer = Vec::new();
    let mut first_candidate: Option<Vec<String>> = None;

    let columns = loop {
        let Some(line) = next_line(&mut reader, &mut buffer)? else {
            return Err(PipelineError::ColumnsNotFound {
                source_col: spec.source.clone(),
                target_col: spec.target.clone(),
                available: first_candidate.unwrap_or_default(),
            });
        };

        let cells = line.split('\t').collect::<Vec<_>>();
        if let Some(columns) = resolve_header(&cells, spec) {
            break columns;
        }

        if first_candidate.is_none() && !is_skippable(&line) {
            first_candidate = Some(cells.iter().map(|cell| cell.trim().to_owned()).collect());
        }
        stats.metadata_lines += 1;
    };

    debug!(?columns, skipped = stats.metadata_lines, "resolved relation header");

    let mut records = Vec::new();
    while let Some(line) = next_line(&mut reader, &mut buffer)? {
        if is_skippable(&line) {
            continue;
        }
        if limit.is_some_and(|limit| stats.data_rows >= limit) {
            break;
        }
        stats.data_rows += 1;

        let cells = line.split('\t').collect::<Vec<_>>();
        let (Some(source), Some(target)) = (
            cell(&cells, Some(columns.source)),
            cell(&cells, Some(columns.target)),
        ) else {
            stats.missing_endpoint += 1;
            debug!(row = stats.data_rows, "skipping row with missing endpoint");
            continue;
        };

        let weight = match cell(&cells, columns.weight).map(str::parse::<f64>) {
            Some(Ok(value)) if value.is_finite() => value,
            Some(_) => {
                stats.coerced_weight += 1;
                1.0
            }
            None => 1.0,
        };

        let confidence = match cell(&cells, columns.confidence).map(str::parse::<f64>) {
            Some(Ok(value)) if value.is_finite() => Some(value.clamp(0.0, 1.0)),
            Some(_) => {
                stats.dropped_confidence += 1;
                None
            }
            None => None,
        };

        records.push(RelationRecord {
            source: source.to_owned(),
            target: target.to_owned(),
            weight,
            confidence,
            provenance: cell(&cells, columns.provenance)
                .map(split_list)
                .unwrap_or_default(),
            source_label: cell(&cells, columns.source_label).map(str::to_owned),
            target_label: cell(&cells, columns.target_label).map(str::to_owned),
            source_localities: cell(&cells, columns.source_locality)
                .map(split_list)
                .unwrap_or_default(),
            target_localities: cell(&cells, columns.target_locality)
                .map(split_list)
                .unwrap_or_default(),
        });
    }

    Ok((records, stats))
}

/// Reads an optional node table with an `id` column and optional `label` and
/// `locality` columns.
pub fn read_node_table<R: BufRead>(mut reader: R) -> Result<Vec<NodeAnnotation>> {
    let mut buffer = Vec::new();

    let (id_col, label_col, locality_col) = loop {
        let Some(line) = next_line(&mut reader, &mut buffer)? else {
            return Err(PipelineError::NodeColumnMissing("id".to_owned()));
        };
        if is_skippable(&line) {
            continue;
        }

        let cells = line.split('\t').collect::<Vec<_>>();
        if let Some(id_col) = find_column(&cells, "id") {
            break (
                id_col,
                find_column(&cells, "label"),
                find_column(&cells, "locality"),
            );
        }
    };

    let mut nodes = Vec::new();
    while let Some(line) = next_line(&mut reader, &mut buffer)? {
        if is_skippable(&line) {
            continue;
        }

        let cells = line.split('\t').collect::<Vec<_>>();
        let Some(id) = cell(&cells, Some(id_col)) else {
            continue;
        };

        nodes.push(NodeAnnotation {
            id: id.to_owned(),
            label: cell(&cells, label_col).map(str::to_owned),
            localities: cell(&cells, locality_col)
                .map(split_list)
                .unwrap_or_default(),
        });
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ColumnSpec {
        ColumnSpec {
            weight: Some("weight".into()),
            confidence: Some("afmprob".into()),
            provenance: Some("allDBs".into()),
            ..ColumnSpec::new("protein1", "protein2")
        }
    }

    #[test]
    fn find_column_prefers_exact_then_substring() {
        let cells = ["Protein1_name", "protein1", "PROTEIN 2"];
        assert_eq!(find_column(&cells, "protein1"), Some(1));
        assert_eq!(find_column(&cells, "protein-2"), Some(2));
        assert_eq!(find_column(&cells, "name"), Some(0));
        assert_eq!(find_column(&cells, "missing"), None);
    }

    #[test]
    fn header_detection_skips_metadata_block() {
        let input = "# exported 2024-01-01\nsource db: mixed\n\nprotein1\tprotein2\tall_DBs\tafm_prob\n\
                     p1\tp2\tdbX\t0.9\n";
        let (records, stats) = read_relations(input.as_bytes(), &spec(), None).unwrap();

        assert_eq!(stats.metadata_lines, 3);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].provenance, vec!["dbX"]);
        assert_eq!(records[0].confidence, Some(0.9));
    }

    #[test]
    fn rows_are_best_effort() {
        let input = "protein1\tprotein2\tweight\tafmprob\n\
                     p1\t\t2\t0.5\n\
                     p1\tp2\tabc\tn/a\n\
                     # trailing comment\n\
                     p2\tp3\t2.5\t1.7\n";
        let (records, stats) = read_relations(input.as_bytes(), &spec(), None).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(stats.missing_endpoint, 1);
        assert_eq!(stats.coerced_weight, 1);
        assert_eq!(stats.dropped_confidence, 1);
        assert_eq!(records[0].weight, 1.0);
        assert_eq!(records[0].confidence, None);
        assert_eq!(records[1].weight, 2.5);
        assert_eq!(records[1].confidence, Some(1.0));
    }

    #[test]
    fn unmatched_columns_are_fatal_and_name_present_columns() {
        let input = "# meta\nalpha\tbeta\tgamma\nx\ty\tz\n";
        let error = read_relations(input.as_bytes(), &spec(), None).unwrap_err();

        match &error {
            PipelineError::ColumnsNotFound { available, .. } => {
                assert_eq!(available, &vec!["alpha", "beta", "gamma"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.to_string().contains("alpha, beta, gamma"));
    }

    #[test]
    fn limit_caps_data_rows() {
        let input = "protein1\tprotein2\np1\tp2\np2\tp3\np3\tp4\n";
        let (records, _) = read_relations(input.as_bytes(), &spec(), Some(2)).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut input = b"protein1\tprotein2\n".to_vec();
        input.extend_from_slice(b"p\xff1\tp2\n");
        let (records, _) = read_relations(input.as_slice(), &spec(), None).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].source.starts_with('p'));
    }

    #[test]
    fn node_table_reads_labels_and_localities() {
        let input = "# nodes\nid\tlabel\tlocality\nP1\tTP53\tNucleus;Cytosol\nP2\t\t\n";
        let nodes = read_node_table(input.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].label.as_deref(), Some("TP53"));
        assert_eq!(nodes[0].localities, vec!["Nucleus", "Cytosol"]);
        assert_eq!(nodes[1].label, None);
    }
}
