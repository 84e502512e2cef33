//! Backend-neutral description of one frame.

use eframe::egui::{Color32, Pos2};

use super::filter::{FilterOutcome, edge_passes};
use super::index::GraphIndex;
use super::lod::cluster_radius;
use super::render_utils::{
    BACKGROUND, LABEL, NOVEL_EDGE, PLAIN_EDGE, blend_color, circle_visible, community_color, dim_color,
    edge_visible, heat_color, with_alpha,
};
use super::state::{FocusPhase, LodMode, ViewState};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub index: usize,
    pub position: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub outline: Option<Color32>,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneEdge {
    pub from: Pos2,
    pub to: Pos2,
    pub color: Color32,
    pub width: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneCluster {
    pub position: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub label: String,
}

/// Everything a renderer draws, in screen space, back to front: clusters,
/// edges, nodes, then labels and overlay text.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneIntent {
    pub background: Color32,
    pub label_color: Color32,
    pub clusters: Vec<SceneCluster>,
    pub edges: Vec<SceneEdge>,
    pub nodes: Vec<SceneNode>,
    pub overlay: Vec<String>,
}

impl SceneIntent {
    pub fn empty() -> Self {
        Self {
            background: BACKGROUND,
            label_color: LABEL,
            clusters: Vec::new(),
            edges: Vec::new(),
            nodes: Vec::new(),
            overlay: Vec::new(),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = (&SceneNode, &str)> {
        self.nodes
            .iter()
            .filter_map(|node| node.label.as_deref().map(|label| (node, label)))
    }
}

pub struct SceneInputs<'a> {
    pub index: &'a GraphIndex,
    pub filter: &'a FilterOutcome,
    pub view: &'a ViewState,
    pub radii: &'a [f32],
    pub mode: LodMode,
    pub edges_suppressed: bool,
    pub labels_ready: bool,
}

/// Nodes drawn this frame. While focused only the focused node and its
/// filter-visible neighbours are drawn, in either mode.
pub fn drawable_nodes(inputs: &SceneInputs<'_>) -> Vec<usize> {
    match inputs.view.focus.phase() {
        FocusPhase::Focused(node) => std::iter::once(node)
            .chain(
                inputs.index.adjacency[node]
                    .iter()
                    .copied()
                    .filter(|&neighbor| inputs.filter.node_visible(neighbor)),
            )
            .collect(),
        _ if inputs.mode == LodMode::Cluster => Vec::new(),
        _ => (0..inputs.index.node_count())
            .filter(|&node| inputs.filter.node_visible(node))
            .collect(),
    }
}

fn drawn_edges(inputs: &SceneInputs<'_>) -> Vec<usize> {
    if inputs.edges_suppressed {
        return Vec::new();
    }

    let index = inputs.index;
    match inputs.view.focus.phase() {
        FocusPhase::Focused(node) => index.incident[node]
            .iter()
            .copied()
            .filter(|&edge| {
                let edge_ref = &index.edges[edge];
                inputs.filter.node_visible(edge_ref.other(node)) && edge_passes(edge_ref, &inputs.view.filter)
            })
            .collect(),
        _ if inputs.mode == LodMode::Cluster => Vec::new(),
        _ if inputs.view.show_all_edges => (0..index.edge_count())
            .filter(|&edge| inputs.filter.edge_visible(edge))
            .collect(),
        FocusPhase::Previewing(node) => index.incident[node].clone(),
        FocusPhase::Idle => Vec::new(),
    }
}

fn node_fill(index: &GraphIndex, node: usize) -> Color32 {
    let record = &index.nodes[node];
    if record.has_novelty {
        heat_color(index.novel_edge_counts[node], index.max_novel_edges)
    } else {
        community_color(record.community)
    }
}

pub fn compose_scene(inputs: &SceneInputs<'_>) -> SceneIntent {
    let view = inputs.view;
    let viewport = view.viewport;
    let camera = &view.camera;
    let index = inputs.index;
    let phase = view.focus.phase();
    let focused = view.focus.focused;
    let mut scene = SceneIntent::empty();

    if inputs.mode == LodMode::Cluster {
        let fade = if focused.is_some() { 0.35 } else { 1.0 };
        for cluster in &index.clusters {
            let position = camera.world_to_screen(viewport, cluster.position);
            let radius = cluster_radius(cluster.size, camera.ratio);
            if !circle_visible(viewport, position, radius) {
                continue;
            }
            scene.clusters.push(SceneCluster {
                position,
                radius,
                fill: dim_color(with_alpha(community_color(cluster.community), 170), fade),
                label: format!("{} ({})", cluster.label, cluster.count),
            });
        }
        if focused.is_none() {
            scene.overlay.push("Cluster view: zoom in to see individual proteins".to_owned());
        }
    }

    let padded = viewport.expand(8.0);
    for edge in drawn_edges(inputs) {
        let record = &index.edges[edge];
        let from = camera.world_to_screen(viewport, index.nodes[record.source].position);
        let to = camera.world_to_screen(viewport, index.nodes[record.target].position);
        if !edge_visible(padded, from, to, 2.0) {
            continue;
        }

        let base = if record.novel { NOVEL_EDGE } else { PLAIN_EDGE };
        let (alpha, width) = match phase {
            FocusPhase::Focused(_) => (210, 1.4),
            FocusPhase::Previewing(_) => (170, 1.1),
            FocusPhase::Idle => (70, 0.8),
        };
        scene.edges.push(SceneEdge {
            from,
            to,
            color: with_alpha(base, alpha),
            width,
        });
    }

    for node in drawable_nodes(inputs) {
        let position = camera.world_to_screen(viewport, index.nodes[node].position);
        let radius = inputs.radii.get(node).copied().unwrap_or(3.0);
        if !circle_visible(viewport, position, radius) {
            continue;
        }

        let is_focused = focused == Some(node);
        let is_hovered = view.focus.hovered == Some(node);
        let mut fill = node_fill(index, node);
        if is_focused {
            fill = blend_color(fill, Color32::WHITE, 0.35);
        }

        let label = if is_hovered || (focused.is_some() && inputs.labels_ready) {
            Some(index.nodes[node].label.clone())
        } else {
            None
        };

        scene.nodes.push(SceneNode {
            index: node,
            position,
            radius: if is_focused { radius * 1.3 } else { radius },
            fill,
            outline: (is_focused || is_hovered).then_some(Color32::WHITE),
            label,
        });
    }

    scene
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::super::camera::{CameraState, origin_viewport};
    use super::super::filter::apply_filters;
    use super::super::index::fixtures::dataset;
    use super::super::state::FilterParams;
    use super::*;

    fn index() -> GraphIndex {
        GraphIndex::from_dataset(&dataset(
            &[
                ("p1", -10.0, 0.0, 1, false),
                ("p2", 0.0, 0.0, 2, true),
                ("p3", 10.0, 0.0, 1, true),
                ("p4", 20.0, 0.0, 0, false),
            ],
            &[("p1", "p2", Some(0.9), &["dbX"]), ("p2", "p3", None, &["none"])],
        ))
    }

    fn view() -> ViewState {
        ViewState::new(
            CameraState {
                center: vec2(0.0, 0.0),
                ratio: 0.5,
            },
            origin_viewport(800.0, 600.0),
        )
    }

    fn compose(index: &GraphIndex, view: &ViewState, mode: LodMode, labels_ready: bool) -> SceneIntent {
        let filter = apply_filters(index, view.filter, view.focus.focused);
        let radii = vec![3.0; index.node_count()];
        compose_scene(&SceneInputs {
            index,
            filter: &filter,
            view,
            radii: &radii,
            mode,
            edges_suppressed: false,
            labels_ready,
        })
    }

    #[test]
    fn idle_draws_nodes_without_edges_or_labels() {
        let index = index();
        let scene = compose(&index, &view(), LodMode::Detail, false);
        assert_eq!(scene.nodes.len(), 4);
        assert!(scene.edges.is_empty());
        assert_eq!(scene.labels().count(), 0);
    }

    #[test]
    fn preview_shows_hovered_label_and_unfiltered_edges() {
        let index = index();
        let mut view = view();
        view.focus.hovered = Some(1);
        view.filter = FilterParams {
            confidence_floor: 0.95,
            ..FilterParams::default()
        };

        let scene = compose(&index, &view, LodMode::Detail, false);
        assert_eq!(scene.edges.len(), 2);
        assert_eq!(scene.labels().map(|(_, label)| label).collect::<Vec<_>>(), vec!["P2"]);
    }

    #[test]
    fn focus_hides_non_neighbours_and_waits_for_labels() {
        let index = index();
        let mut view = view();
        view.focus.focused = Some(1);

        let scene = compose(&index, &view, LodMode::Detail, false);
        let drawn = scene.nodes.iter().map(|node| node.index).collect::<Vec<_>>();
        assert_eq!(drawn, vec![1, 0, 2]);
        assert_eq!(scene.edges.len(), 2);
        assert_eq!(scene.labels().count(), 0);

        let scene = compose(&index, &view, LodMode::Detail, true);
        assert_eq!(scene.labels().count(), 3);
    }

    #[test]
    fn cluster_mode_keeps_focused_neighbourhood() {
        let index = index();
        let mut view = view();
        assert!(compose(&index, &view, LodMode::Cluster, false).nodes.is_empty());

        view.focus.focused = Some(2);
        let scene = compose(&index, &view, LodMode::Cluster, false);
        assert_eq!(scene.nodes.len(), 2);
    }

    #[test]
    fn show_all_edges_ignored_while_focused() {
        let index = index();
        let mut view = view();
        view.show_all_edges = true;
        assert_eq!(compose(&index, &view, LodMode::Detail, false).edges.len(), 2);

        view.focus.focused = Some(3);
        assert!(compose(&index, &view, LodMode::Detail, false).edges.is_empty());
    }
}
