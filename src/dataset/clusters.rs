use std::collections::BTreeMap;

use super::{DatasetCluster, DatasetNode};

pub fn cluster_size(count: usize) -> f32 {
    4.0 + 2.0 * (count as f32).sqrt()
}

/// One meta-node per assigned community, ordered by community id. The label
/// comes from `names` when it has an entry for the community, otherwise from
/// the highest-degree member plus the number of other members.
pub fn summarize_clusters(nodes: &[DatasetNode], names: Option<&[String]>) -> Vec<DatasetCluster> {
    let mut groups: BTreeMap<i64, Vec<&DatasetNode>> = BTreeMap::new();
    for node in nodes.iter().filter(|node| node.community >= 0) {
        groups.entry(node.community).or_default().push(node);
    }

    groups
        .into_iter()
        .map(|(community, members)| {
            let count = members.len();
            let (sum_x, sum_y) = members
                .iter()
                .fold((0.0f64, 0.0f64), |(x, y), node| (x + node.x as f64, y + node.y as f64));

            let named = names
                .and_then(|names| usize::try_from(community).ok().and_then(|index| names.get(index)))
                .cloned();
            let label = named.unwrap_or_else(|| {
                let lead = members
                    .iter()
                    .max_by(|a, b| a.degree.cmp(&b.degree).then_with(|| b.id.cmp(&a.id)))
                    .map(|node| node.label.as_str())
                    .unwrap_or_default();
                if count > 1 {
                    format!("{lead} +{}", count - 1)
                } else {
                    lead.to_owned()
                }
            });

            DatasetCluster {
                id: format!("cluster:{community}"),
                label,
                x: (sum_x / count as f64) as f32,
                y: (sum_y / count as f64) as f32,
                size: cluster_size(count),
                community,
                count,
            }
        })
        .collect()
}
