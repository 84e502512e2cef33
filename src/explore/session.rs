//! Everything the explorer knows about one loaded dataset, independent of
//! egui painting. The UI feeds it pointer and time, then asks for a scene.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use eframe::egui::{Pos2, Rect, Vec2, vec2};
use tracing::{debug, trace, warn};

use crate::config::RuntimeConfig;
use crate::external::AnnotationSource;

use super::camera::{CameraAnimator, CameraState, bounds_of, clamp_frame, pick_nearest};
use super::fetch::{BackgroundTask, Poll};
use super::filter::{FilterOutcome, NeighborCounts, apply_filters};
use super::focus::{CameraTarget, Effect, FocusEvent, FocusMachine};
use super::index::GraphIndex;
use super::lod::LodController;
use super::scene::{SceneInputs, SceneIntent, compose_scene, drawable_nodes};
use super::state::{FilterParams, Generation, LodMode, ViewState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationStatus {
    Idle,
    Loading,
    Ready(String),
    Unavailable,
}

pub struct FocusDetails<'a> {
    pub node: usize,
    pub counts: NeighborCounts,
    /// Filter-visible neighbours, highest degree first.
    pub neighbors: Vec<usize>,
    pub annotation: &'a AnnotationStatus,
}

pub struct ExplorationSession {
    index: GraphIndex,
    config: RuntimeConfig,
    view: ViewState,
    focus: FocusMachine,
    lod: LodController,
    filter: FilterOutcome,
    animator: CameraAnimator,
    degrees: Vec<usize>,
    annotations: Option<Arc<dyn AnnotationSource>>,
    annotation_task: Option<BackgroundTask<Option<String>>>,
    annotation: AnnotationStatus,
    repaint: bool,
}

impl ExplorationSession {
    pub fn new(
        index: GraphIndex,
        config: RuntimeConfig,
        viewport: Rect,
        annotations: Option<Arc<dyn AnnotationSource>>,
    ) -> Self {
        let camera = CameraState::fit(
            index.bounds,
            viewport,
            0.05,
            1.0,
            config.min_ratio,
            config.max_ratio,
        );
        let degrees = index.nodes.iter().map(|node| node.degree).collect::<Vec<_>>();
        let mut lod = LodController::new(&config);
        lod.update(camera.ratio, &degrees);

        let mut view = ViewState::new(camera, viewport);
        view.lod = lod.mode();
        let filter = apply_filters(&index, view.filter, None);

        Self {
            focus: FocusMachine::new(config.defocus_delay_secs),
            index,
            config,
            view,
            lod,
            filter,
            animator: CameraAnimator::default(),
            degrees,
            annotations,
            annotation_task: None,
            annotation: AnnotationStatus::Idle,
            repaint: true,
        }
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn filter_outcome(&self) -> &FilterOutcome {
        &self.filter
    }

    pub fn lod_mode(&self) -> LodMode {
        self.view.lod
    }

    pub fn labels_ready(&self) -> bool {
        self.focus.labels_ready()
    }

    pub fn annotation(&self) -> &AnnotationStatus {
        &self.annotation
    }

    pub fn focus_details(&self) -> Option<FocusDetails<'_>> {
        let node = self.view.focus.focused?;
        let mut neighbors = self.index.adjacency[node]
            .iter()
            .copied()
            .filter(|&neighbor| self.filter.node_visible(neighbor))
            .collect::<Vec<_>>();
        neighbors.sort_by(|&a, &b| {
            self.index.nodes[b]
                .degree
                .cmp(&self.index.nodes[a].degree)
                .then_with(|| self.index.nodes[a].label.cmp(&self.index.nodes[b].label))
        });

        Some(FocusDetails {
            node,
            counts: self.filter.focus.unwrap_or_default(),
            neighbors,
            annotation: &self.annotation,
        })
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.view.viewport != viewport {
            self.view.viewport = viewport;
            self.repaint = true;
        }
    }

    /// Fits the whole graph into the current viewport.
    pub fn reset_camera(&mut self, now: f64) {
        self.interrupt_animation(now);
        self.view.camera = CameraState::fit(
            self.index.bounds,
            self.view.viewport,
            0.05,
            1.0,
            self.config.min_ratio,
            self.config.max_ratio,
        );
        self.update_lod();
        self.repaint = true;
    }

    pub fn set_filter(&mut self, params: FilterParams) {
        let params = params.sanitized();
        if self.view.filter == params {
            return;
        }
        self.view.filter = params;
        self.refilter();
    }

    pub fn set_show_all_edges(&mut self, show: bool) {
        if self.view.show_all_edges != show {
            self.view.show_all_edges = show;
            self.repaint = true;
        }
    }

    fn refilter(&mut self) {
        self.filter = apply_filters(&self.index, self.view.filter, self.view.focus.focused);
        debug!(
            visible_nodes = self.filter.visible_nodes,
            visible_edges = self.filter.visible_edges,
            "filters applied"
        );
        self.repaint = true;
    }

    fn scene_inputs(&self) -> SceneInputs<'_> {
        SceneInputs {
            index: &self.index,
            filter: &self.filter,
            view: &self.view,
            radii: self.lod.radii(),
            mode: self.view.lod,
            edges_suppressed: self.lod.edges_suppressed(self.view.camera.ratio),
            labels_ready: self.focus.labels_ready(),
        }
    }

    pub fn scene(&self) -> SceneIntent {
        compose_scene(&self.scene_inputs())
    }

    pub fn pick_node(&self, pointer: Pos2) -> Option<usize> {
        let candidates = drawable_nodes(&self.scene_inputs());
        pick_nearest(
            &self.view.camera,
            self.view.viewport,
            pointer,
            self.config.pick_radius_px,
            candidates
                .into_iter()
                .map(|node| (node, self.index.nodes[node].position)),
        )
    }

    fn pick_cluster(&self, pointer: Pos2) -> Option<usize> {
        if self.view.lod != LodMode::Cluster {
            return None;
        }
        let world = self.view.camera.screen_to_world(self.view.viewport, pointer);
        self.index
            .clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| (index, (cluster.position - world).length()))
            .filter(|(index, distance)| {
                let radius = super::lod::cluster_radius(self.index.clusters[*index].size, self.view.camera.ratio);
                *distance <= radius.max(self.config.pick_radius_px) * self.view.camera.ratio
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub fn hover_at(&mut self, pointer: Option<Pos2>, now: f64) {
        let event = match pointer.and_then(|pointer| self.pick_node(pointer)) {
            Some(node) => FocusEvent::PointerEnter(node),
            None => FocusEvent::PointerLeave,
        };
        self.dispatch(event, now);
    }

    pub fn click_at(&mut self, pointer: Pos2, now: f64) {
        if let Some(node) = self.pick_node(pointer) {
            self.dispatch(FocusEvent::Click(node), now);
            return;
        }

        if self.view.focus.focused.is_none()
            && let Some(cluster) = self.pick_cluster(pointer)
        {
            self.fly_to_cluster(cluster, now);
            return;
        }

        self.dispatch(FocusEvent::ClickEmpty, now);
    }

    pub fn search_jump(&mut self, node: usize, now: f64) {
        if node < self.index.node_count() {
            self.dispatch(FocusEvent::SearchJump(node), now);
        }
    }

    fn fly_to_cluster(&mut self, cluster: usize, now: f64) {
        let target = CameraState {
            center: self.index.clusters[cluster].position,
            ratio: self.view.camera.ratio.min(self.config.cluster_ratio * 0.8),
        };
        let generation = self.view.generation.bump();
        self.animator
            .start(self.view.camera, target, now, self.config.animation_secs, generation.value());
        self.repaint = true;
    }

    pub fn zoom_at(&mut self, pointer: Pos2, factor: f32, now: f64) {
        self.interrupt_animation(now);
        self.view.camera.zoom_at(
            self.view.viewport,
            pointer,
            factor,
            self.config.min_ratio,
            self.config.max_ratio,
        );
        self.view.camera.clamp_center(self.index.bounds);
        self.update_lod();
        self.repaint = true;
    }

    pub fn pan_by(&mut self, screen_delta: Vec2, now: f64) {
        if screen_delta == Vec2::ZERO {
            return;
        }
        self.interrupt_animation(now);
        self.view.camera.pan_by(screen_delta);
        self.view.camera.clamp_center(self.index.bounds);
        self.repaint = true;
    }

    /// User input wins over a running flight; the flight counts as finished.
    fn interrupt_animation(&mut self, now: f64) {
        if let Some(token) = self.animator.interrupt() {
            self.dispatch(FocusEvent::AnimationDone(Generation::from_value(token)), now);
        }
    }

    fn update_lod(&mut self) {
        let change = self.lod.update(self.view.camera.ratio, &self.degrees);
        if change.mode_changed {
            debug!(mode = ?self.lod.mode(), ratio = self.view.camera.ratio, "level of detail changed");
        }
        self.view.lod = self.lod.mode();
    }

    /// Advances animations, timers and background lookups. Returns whether
    /// another frame is needed.
    pub fn tick(&mut self, now: f64) -> bool {
        if let Some(step) = self.animator.step(now) {
            self.view.camera = step.camera;
            self.update_lod();
            self.repaint = true;
            if let Some(token) = step.finished {
                self.dispatch(FocusEvent::AnimationDone(Generation::from_value(token)), now);
            }
        }

        self.dispatch(FocusEvent::Tick(now), now);
        self.poll_annotation();

        let busy = self.animator.is_running()
            || self.focus.has_pending_defocus()
            || self.annotation == AnnotationStatus::Loading;
        std::mem::take(&mut self.repaint) || busy
    }

    fn dispatch(&mut self, event: FocusEvent, now: f64) {
        let focused_before = self.view.focus.focused;
        let effects = self.focus.handle(event, &mut self.view);
        if self.view.focus.focused != focused_before {
            self.refilter();
        }

        for effect in effects {
            self.apply(effect, now);
        }
    }

    fn apply(&mut self, effect: Effect, now: f64) {
        match effect {
            Effect::AnimateCamera { target, generation } => {
                let to = match target {
                    CameraTarget::Frame(node) => self.frame_camera(node),
                    CameraTarget::Restore(camera) => camera,
                };
                self.animator
                    .start(self.view.camera, to, now, self.config.animation_secs, generation.value());
                self.repaint = true;
            }
            Effect::RequestAnnotation { node, generation } => self.request_annotation(node, generation),
            Effect::CancelAnnotation => {
                if let Some(task) = self.annotation_task.take() {
                    task.cancel();
                }
                self.annotation = AnnotationStatus::Idle;
            }
            Effect::Repaint => self.repaint = true,
        }
    }

    /// Camera that frames `node` and its visible neighbours, kept inside the
    /// dataset bounds and never zoomed out past ratio 1.
    fn frame_camera(&self, node: usize) -> CameraState {
        let points = std::iter::once(node)
            .chain(
                self.index.adjacency[node]
                    .iter()
                    .copied()
                    .filter(|&neighbor| self.filter.node_visible(neighbor)),
            )
            .map(|index| self.index.nodes[index].position);

        let position = self.index.nodes[node].position;
        let frame = bounds_of(points).unwrap_or_else(|| Rect::from_center_size(position.to_pos2(), Vec2::ZERO));
        let min = self.config.min_frame_extent;
        let frame = Rect::from_center_size(frame.center(), frame.size().max(vec2(min, min)));
        let frame = clamp_frame(frame, self.index.bounds);

        CameraState::fit(
            frame,
            self.view.viewport,
            self.config.frame_padding,
            min,
            self.config.min_ratio,
            1.0,
        )
    }

    fn request_annotation(&mut self, node: usize, generation: Generation) {
        if let Some(task) = self.annotation_task.take() {
            task.cancel();
        }

        let Some(source) = self.annotations.clone() else {
            self.annotation = AnnotationStatus::Unavailable;
            return;
        };

        let label = self.index.nodes[node].label.clone();
        self.annotation = AnnotationStatus::Loading;
        self.annotation_task = Some(BackgroundTask::spawn(generation, move |cancel| {
            if cancel.load(Ordering::Acquire) {
                return None;
            }
            match source.lookup(&label) {
                Ok(found) => found.map(|annotation| annotation.text()),
                Err(error) => {
                    warn!(%label, %error, "annotation lookup failed");
                    None
                }
            }
        }));
    }

    fn poll_annotation(&mut self) {
        let Some(task) = &self.annotation_task else {
            return;
        };

        match task.poll() {
            Poll::Pending => {}
            Poll::Ready(text) => {
                if task.generation() == self.view.generation {
                    self.annotation = match text {
                        Some(text) => AnnotationStatus::Ready(text),
                        None => AnnotationStatus::Unavailable,
                    };
                    self.repaint = true;
                } else {
                    trace!(stale = task.generation().value(), "dropping stale annotation");
                }
                self.annotation_task = None;
            }
            Poll::Gone => {
                self.annotation_task = None;
                if self.annotation == AnnotationStatus::Loading {
                    self.annotation = AnnotationStatus::Unavailable;
                }
            }
        }
    }

    /// Cancels background work. Called before the session is dropped.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.annotation_task.take() {
            task.cancel();
        }
        self.animator.interrupt();
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::super::camera::origin_viewport;
    use super::super::index::fixtures::dataset;
    use super::*;

    fn session() -> ExplorationSession {
        let index = GraphIndex::from_dataset(&dataset(
            &[
                ("p1", -100.0, 0.0, 1, false),
                ("p2", 0.0, 0.0, 2, true),
                ("p3", 100.0, 0.0, 1, true),
            ],
            &[("p1", "p2", Some(0.9), &["dbX"]), ("p2", "p3", None, &["none"])],
        ));
        ExplorationSession::new(index, RuntimeConfig::default(), origin_viewport(800.0, 600.0), None)
    }

    fn settle(session: &mut ExplorationSession, from: f64) -> f64 {
        let mut now = from;
        for _ in 0..200 {
            now += 0.05;
            if !session.tick(now) {
                break;
            }
        }
        now
    }

    #[test]
    fn initial_camera_fits_dataset() {
        let session = session();
        let scene = session.scene();
        assert_eq!(scene.nodes.len(), 3);
        assert!(scene.nodes.iter().all(|node| origin_viewport(800.0, 600.0).contains(node.position)));
    }

    #[test]
    fn clicking_node_focuses_and_frames_it() {
        let mut session = session();
        let target = session.scene().nodes[2].position;
        session.click_at(target, 0.0);
        assert_eq!(session.view().focus.focused, Some(2));
        assert_eq!(session.annotation(), &AnnotationStatus::Unavailable);

        settle(&mut session, 0.0);
        assert!(session.labels_ready());
        assert!(session.view().camera.ratio <= 1.0);
        let details = session.focus_details().unwrap();
        assert_eq!(details.neighbors, vec![1]);
        assert_eq!(details.counts.novel_neighbor_count, 1);
    }

    #[test]
    fn focusing_a_corner_keeps_the_frame_inside_the_bounds() {
        let index = GraphIndex::from_dataset(&dataset(
            &[
                ("a", 0.0, 0.0, 1, false),
                ("b", 10.0, 10.0, 1, false),
                ("c", 990.0, 990.0, 1, false),
                ("d", 1000.0, 1000.0, 1, false),
            ],
            &[("a", "b", Some(0.9), &["dbX"]), ("c", "d", Some(0.9), &["dbX"])],
        ));
        let mut session =
            ExplorationSession::new(index, RuntimeConfig::default(), origin_viewport(800.0, 600.0), None);
        let half = session.config.min_frame_extent * 0.5;

        session.search_jump(0, 0.0);
        settle(&mut session, 0.0);

        let center = session.view().camera.center;
        assert!((center - vec2(half, half)).length() < 1e-3, "centre {center:?}");
        assert!(center.x - half >= 0.0 && center.y - half >= 0.0);
    }

    #[test]
    fn zoom_out_enters_cluster_mode() {
        let mut session = session();
        for _ in 0..40 {
            session.zoom_at(pos2(400.0, 300.0), 1.25, 0.0);
        }
        assert_eq!(session.lod_mode(), LodMode::Cluster);
        assert!(session.scene().nodes.is_empty());
    }
}
