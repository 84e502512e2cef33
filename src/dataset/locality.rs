//! Splits every protein into one instance per declared subcellular locality
//! and lays the instances out in compartment disks.

use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::Rng;
use tracing::debug;

use crate::network::{GraphAssembler, InteractionGraph, NodeAnnotation, RelationRecord};

use super::ontology::LocalityGroup;
use super::{Dataset, DatasetView, build_dataset};

pub const UNKNOWN_LOCALITY: &str = "unknown";

/// `base@locality`. `%` and `@` in the base id are percent-escaped so the
/// first `@` always ends the base and distinct pairs never share an id.
pub fn instance_id(base_id: &str, locality: &str) -> String {
    let base = base_id.replace('%', "%25").replace('@', "%40");
    format!("{base}@{locality}")
}

/// Picks the localities an edge is drawn between: the first locality of `a`
/// (declaration order) that `b` also declares, otherwise each side's first.
pub fn route_edge<'a>(a: &'a [String], b: &'a [String]) -> (&'a str, &'a str) {
    if let Some(shared) = a.iter().find(|locality| b.contains(locality)) {
        return (shared, shared);
    }

    let first = |list: &'a [String]| list.first().map_or(UNKNOWN_LOCALITY, String::as_str);
    (first(a), first(b))
}

struct Disk {
    center: Vec2,
    radius: f32,
}

/// Lays out one disk per locality. Disks are placed on a grid inside the
/// region of their ontology group, largest locality first.
fn compartment_disks(ordered: &[(String, usize)], instance_count: usize) -> HashMap<String, Disk> {
    let extent = (400.0 * (instance_count as f32).sqrt()).max(800.0);
    let origin = vec2(-extent * 0.5, -extent * 0.5);
    let mut disks = HashMap::with_capacity(ordered.len());

    for group in LocalityGroup::ALL {
        let members = ordered
            .iter()
            .filter(|(name, _)| LocalityGroup::classify(name) == group)
            .collect::<Vec<_>>();
        let Some((_, max_count)) = members.first() else {
            continue;
        };

        let k = members.len();
        let cols = (k as f32).sqrt().ceil().max(1.0) as usize;
        let rows = k.div_ceil(cols);
        let (rx, ry, rw, rh) = group.region();
        let cell_w = rw * extent / cols as f32;
        let cell_h = rh * extent / rows as f32;

        for (slot, (name, count)) in members.iter().enumerate() {
            let col = slot % cols;
            let row = slot / cols;
            let center = origin
                + vec2(
                    rx * extent + (col as f32 + 0.5) * cell_w,
                    ry * extent + (row as f32 + 0.5) * cell_h,
                );
            let radius = 0.45 * cell_w.min(cell_h) * (*count as f32 / *max_count as f32).sqrt();
            disks.insert(name.clone(), Disk { center, radius });
        }
    }

    disks
}

/// Builds the locality dataset. Only the in-disk sampling uses `rng`.
pub fn build_locality_dataset<R: Rng>(graph: &InteractionGraph, rng: &mut R) -> Dataset {
    let fallback = vec![UNKNOWN_LOCALITY.to_owned()];
    let localities = graph
        .nodes
        .iter()
        .map(|node| {
            if node.localities.is_empty() {
                &fallback
            } else {
                &node.localities
            }
        })
        .collect::<Vec<_>>();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut instances = Vec::new();
    for (node, list) in graph.nodes.iter().zip(&localities) {
        for locality in list.iter() {
            *counts.entry(locality.as_str()).or_default() += 1;
            instances.push((node.id.as_str(), locality.as_str(), node.label.as_str()));
        }
    }

    let mut ordered = counts
        .into_iter()
        .map(|(name, count)| (name.to_owned(), count))
        .collect::<Vec<_>>();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let community_of = ordered
        .iter()
        .enumerate()
        .map(|(index, (name, _))| (name.as_str(), index as i64))
        .collect::<HashMap<_, _>>();

    let declared = instances
        .iter()
        .map(|(base, locality, label)| NodeAnnotation {
            id: instance_id(base, locality),
            label: Some((*label).to_owned()),
            localities: vec![(*locality).to_owned()],
        })
        .collect::<Vec<_>>();

    let mut assembler = GraphAssembler::new(graph.directed);
    assembler.declare_nodes(&declared);
    for edge in &graph.edges {
        let (from, to) = route_edge(localities[edge.source], localities[edge.target]);
        assembler.add_relation(&RelationRecord {
            source: instance_id(&graph.nodes[edge.source].id, from),
            target: instance_id(&graph.nodes[edge.target].id, to),
            weight: edge.weight,
            confidence: edge.confidence,
            provenance: edge.provenance.clone(),
            source_label: None,
            target_label: None,
            source_localities: Vec::new(),
            target_localities: Vec::new(),
        });
    }
    let (split, stats) = assembler.finish();

    let disks = compartment_disks(&ordered, instances.len());
    let mut positions = Vec::with_capacity(instances.len());
    let mut communities = Vec::with_capacity(instances.len());
    for (_, locality, _) in &instances {
        let position = disks.get(*locality).map_or(Vec2::ZERO, |disk| {
            let r = disk.radius * rng.gen_range(0.0f32..1.0).sqrt();
            let theta = TAU * rng.gen_range(0.0f32..1.0);
            disk.center + vec2(theta.cos(), theta.sin()) * r
        });
        positions.push(position);
        communities.push(community_of.get(locality).copied().unwrap_or(-1));
    }

    debug!(
        instances = instances.len(),
        localities = ordered.len(),
        edges = split.edge_count(),
        ?stats,
        "built locality split"
    );

    let names = ordered.into_iter().map(|(name, _)| name).collect::<Vec<_>>();
    let mut dataset = build_dataset(&split, &positions, &communities, DatasetView::Locality, Some(&names));
    for (node, (base, locality, _)) in dataset.nodes.iter_mut().zip(&instances) {
        node.base_id = Some((*base).to_owned());
        node.locality = Some((*locality).to_owned());
    }
    dataset
}
