//! Louvain modularity clustering.
//!
//! Local moving followed by aggregation of communities into super-nodes,
//! repeated until a level produces no move.

use std::collections::HashMap;

const MAX_SWEEPS: usize = 32;

struct LevelGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight: f64,
}

impl LevelGraph {
    fn from_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut adjacency = vec![Vec::new(); node_count];
        let mut degrees = vec![0.0; node_count];
        let mut total_weight = 0.0;

        for &(from, to, weight) in edges {
            if from == to || from >= node_count || to >= node_count {
                continue;
            }
            adjacency[from].push((to, weight));
            adjacency[to].push((from, weight));
            degrees[from] += weight;
            degrees[to] += weight;
            total_weight += weight;
        }

        Self {
            adjacency,
            self_loops: vec![0.0; node_count],
            degrees,
            total_weight,
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns each node's community and whether anything moved.
    fn local_moving(&self) -> (Vec<usize>, bool) {
        let n = self.node_count();
        let mut community = (0..n).collect::<Vec<_>>();
        let mut totals = self.degrees.clone();
        let two_m = 2.0 * self.total_weight;
        let mut moved_any = false;

        if two_m <= 0.0 {
            return (community, false);
        }

        let mut links_to = vec![0.0; n];
        let mut touched = Vec::new();

        for _ in 0..MAX_SWEEPS {
            let mut moved = false;

            for node in 0..n {
                let current = community[node];
                let degree = self.degrees[node];

                for &(neighbor, weight) in &self.adjacency[node] {
                    let target = community[neighbor];
                    if links_to[target] == 0.0 {
                        touched.push(target);
                    }
                    links_to[target] += weight;
                }

                totals[current] -= degree;
                let mut best = current;
                let mut best_gain = links_to[current] - totals[current] * degree / two_m;

                for &candidate in &touched {
                    let gain = links_to[candidate] - totals[candidate] * degree / two_m;
                    if gain > best_gain + 1e-12 || (gain > best_gain - 1e-12 && candidate < best && best != current) {
                        best_gain = gain;
                        best = candidate;
                    }
                }

                totals[best] += degree;
                if best != current {
                    community[node] = best;
                    moved = true;
                    moved_any = true;
                }

                for &target in &touched {
                    links_to[target] = 0.0;
                }
                touched.clear();
            }

            if !moved {
                break;
            }
        }

        (community, moved_any)
    }

    fn aggregate(&self, community: &[usize], community_count: usize) -> Self {
        let mut merged: Vec<HashMap<usize, f64>> = vec![HashMap::new(); community_count];
        let mut self_loops = vec![0.0; community_count];
        let mut degrees = vec![0.0; community_count];

        for (node, neighbors) in self.adjacency.iter().enumerate() {
            let from = community[node];
            degrees[from] += self.degrees[node];
            self_loops[from] += self.self_loops[node];

            for &(neighbor, weight) in neighbors {
                let to = community[neighbor];
                if from == to {
                    self_loops[from] += weight * 0.5;
                } else {
                    *merged[from].entry(to).or_insert(0.0) += weight;
                }
            }
        }

        let adjacency = merged
            .into_iter()
            .map(|links| {
                let mut links = links.into_iter().collect::<Vec<_>>();
                links.sort_by_key(|&(to, _)| to);
                links
            })
            .collect();

        Self {
            adjacency,
            self_loops,
            degrees,
            total_weight: self.total_weight,
        }
    }
}

/// Renumbers arbitrary community labels to `0..count` in first-seen order.
fn compact(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping = HashMap::new();
    let compacted = labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect();
    (compacted, mapping.len())
}

/// Assigns a community to every node. Ids are ordered by community size,
/// largest first, ties broken by lowest member index.
pub fn louvain(node_count: usize, edges: &[(usize, usize, f64)], max_levels: usize) -> Vec<usize> {
    let mut membership = (0..node_count).collect::<Vec<_>>();
    let mut level = LevelGraph::from_edges(node_count, edges);

    for _ in 0..max_levels.max(1) {
        let (community, moved) = level.local_moving();
        if !moved {
            break;
        }

        let (community, count) = compact(&community);
        for member in &mut membership {
            *member = community[*member];
        }
        if count == level.node_count() {
            break;
        }
        level = level.aggregate(&community, count);
    }

    let (membership, count) = compact(&membership);
    let mut sizes = vec![(0usize, usize::MAX); count];
    for (index, &community) in membership.iter().enumerate() {
        sizes[community].0 += 1;
        sizes[community].1 = sizes[community].1.min(index);
    }
    let mut order = (0..count).collect::<Vec<_>>();
    order.sort_by(|&a, &b| sizes[b].0.cmp(&sizes[a].0).then(sizes[a].1.cmp(&sizes[b].1)));
    let mut rank = vec![0; count];
    for (position, &community) in order.iter().enumerate() {
        rank[community] = position;
    }

    membership.into_iter().map(|community| rank[community]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clique(offset: usize, size: usize, edges: &mut Vec<(usize, usize, f64)>) {
        for a in 0..size {
            for b in (a + 1)..size {
                edges.push((offset + a, offset + b, 1.0));
            }
        }
    }

    #[test]
    fn two_cliques_with_bridge_split_in_two() {
        let mut edges = Vec::new();
        clique(0, 5, &mut edges);
        clique(5, 5, &mut edges);
        edges.push((4, 5, 1.0));

        let communities = louvain(10, &edges, 8);
        assert!(communities[..5].iter().all(|&c| c == communities[0]));
        assert!(communities[5..].iter().all(|&c| c == communities[5]));
        assert_ne!(communities[0], communities[5]);
    }

    #[test]
    fn largest_community_gets_id_zero() {
        let mut edges = Vec::new();
        clique(0, 3, &mut edges);
        clique(3, 6, &mut edges);

        let communities = louvain(9, &edges, 8);
        assert_eq!(communities[3], 0);
        assert_eq!(communities[0], 1);
    }

    #[test]
    fn isolated_nodes_keep_singleton_communities() {
        let communities = louvain(3, &[], 4);
        assert_eq!(communities.len(), 3);
        assert_ne!(communities[0], communities[1]);
    }
}
