use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use eframe::egui::{self, Context, Rect};
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::dataset::{Dataset, DatasetView};
use crate::external::AnnotationSource;

pub mod backend;
pub mod camera;
pub mod fetch;
pub mod filter;
pub mod focus;
pub mod index;
pub mod lod;
pub mod render_utils;
pub mod scene;
pub mod session;
pub mod state;
mod ui;

use backend::{BackendChoice, GlInfo, ViewportSlot, probe_gl, select_renderer};
use camera::origin_viewport;
use fetch::{BackgroundTask, Poll};
use index::GraphIndex;
use session::ExplorationSession;
use state::{FilterParams, Generation};

pub use session::{AnnotationStatus, FocusDetails};

/// Launch parameters for the explorer window.
pub struct ExplorerOptions {
    pub data_dir: PathBuf,
    pub view: DatasetView,
    pub backend: BackendChoice,
    pub annotations: Option<Arc<dyn AnnotationSource>>,
    pub config: RuntimeConfig,
}

pub struct ExplorerApp {
    options: ExplorerOptions,
    ctx: Context,
    gl: Option<GlInfo>,
    slot: ViewportSlot,
    loads: Generation,
    last_viewport: Rect,
    state: AppState,
}

enum AppState {
    Loading {
        view: DatasetView,
        task: BackgroundTask<Result<GraphIndex, String>>,
    },
    Ready(Box<ViewModel>),
    Error {
        view: DatasetView,
        message: String,
    },
}

struct ViewModel {
    session: ExplorationSession,
    filter: FilterParams,
    show_all_edges: bool,
    search: String,
    search_hits: Vec<usize>,
    search_query: String,
    fitted: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

/// What the panels asked the app to do after drawing a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PanelRequests {
    switch_view: Option<DatasetView>,
    reload: bool,
}

fn load_index(path: PathBuf) -> anyhow::Result<GraphIndex> {
    let dataset = Dataset::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let index = GraphIndex::from_dataset(&dataset);
    info!(
        path = %path.display(),
        nodes = index.node_count(),
        edges = index.edge_count(),
        clusters = index.clusters.len(),
        "dataset loaded"
    );
    Ok(index)
}

impl ExplorerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: ExplorerOptions) -> Self {
        let gl = probe_gl(cc);
        let mut app = Self {
            ctx: cc.egui_ctx.clone(),
            gl,
            slot: ViewportSlot::default(),
            loads: Generation::default(),
            last_viewport: origin_viewport(960.0, 720.0),
            state: AppState::Error {
                view: options.view,
                message: String::new(),
            },
            options,
        };
        app.state = app.start_load(app.options.view);
        app
    }

    fn dataset_path(&self, view: DatasetView) -> PathBuf {
        self.options.data_dir.join(view.file_name())
    }

    fn start_load(&mut self, view: DatasetView) -> AppState {
        let path = self.dataset_path(view);
        let generation = self.loads.bump();
        info!(view = view.label(), path = %path.display(), "loading dataset");

        let task = BackgroundTask::spawn(generation, move |_cancel| {
            load_index(path).map_err(|error| format!("{error:#}"))
        });
        AppState::Loading { view, task }
    }

    /// Tears down the renderer, pending loads and session state, then loads
    /// `view` from scratch.
    fn restart(&mut self, view: DatasetView) {
        self.slot.end_session(&self.ctx);
        match &mut self.state {
            AppState::Loading { task, .. } => task.cancel(),
            AppState::Ready(model) => model.session.shutdown(),
            AppState::Error { .. } => {}
        }
        self.options.view = view;
        self.state = self.start_load(view);
    }

    fn ready(&mut self, ctx: &Context, index: GraphIndex) -> AppState {
        let renderer = select_renderer(self.options.backend, self.gl);
        let kind = self.slot.start_session(ctx, renderer).kind();
        info!(backend = kind.label(), "renderer ready");

        let session = ExplorationSession::new(
            index,
            self.options.config.clone(),
            self.last_viewport,
            self.options.annotations.clone(),
        );
        AppState::Ready(Box::new(ViewModel::new(session)))
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut requests = PanelRequests::default();

        match &mut self.state {
            AppState::Loading { view, task } => {
                match task.poll() {
                    Poll::Ready(Ok(index)) => transition = Some(Ok(index)),
                    Poll::Ready(Err(error)) => transition = Some(Err(error)),
                    Poll::Gone => transition = Some(Err("Background load worker disconnected".to_owned())),
                    Poll::Pending => ctx.request_repaint(),
                }

                let heading = format!("Loading {} view...", view.label());
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(heading);
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error { view, message } => {
                let view = *view;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading(format!("Failed to load the {} view", view.label()));
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("Retry").clicked() {
                            requests.reload = true;
                        }
                        for other in [DatasetView::Network, DatasetView::Locality] {
                            if other != view && ui.button(format!("Open {} view", other.label())).clicked() {
                                requests.switch_view = Some(other);
                            }
                        }
                    });
                });
            }
            AppState::Ready(model) => {
                let backend = self.slot.kind();
                requests = model.show(ctx, self.options.view, backend, &mut self.slot);
                self.last_viewport = model.session.view().viewport;
            }
        }

        if let Some(result) = transition {
            self.state = match result {
                Ok(index) => self.ready(ctx, index),
                Err(message) => {
                    warn!(%message, "dataset load failed");
                    AppState::Error {
                        view: self.options.view,
                        message,
                    }
                }
            };
            ctx.request_repaint();
        }

        if let Some(view) = requests.switch_view {
            self.restart(view);
        } else if requests.reload {
            self.restart(self.options.view);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.slot.end_session(&self.ctx);
        match &mut self.state {
            AppState::Loading { task, .. } => task.cancel(),
            AppState::Ready(model) => model.session.shutdown(),
            AppState::Error { .. } => {}
        }
    }
}
