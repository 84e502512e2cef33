//! Scene renderers and the per-viewport renderer lifecycle.

mod canvas;
mod gpu;

use eframe::egui::{Align2, Context, FontId, Painter, Rect, Ui, vec2};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::scene::SceneIntent;

pub use canvas::{CanvasRenderer, Raster};
pub use gpu::GpuRenderer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendChoice {
    #[default]
    Auto,
    Gpu,
    Canvas,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Gpu,
    Canvas,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpu => "GPU mesh",
            Self::Canvas => "CPU canvas",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BackendError {
    #[error("no OpenGL context is available")]
    NoGlContext,

    #[error("OpenGL {major}.{minor} (embedded: {embedded}) is below the required 3.0")]
    UnsupportedGl { major: u32, minor: u32, embedded: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlInfo {
    pub major: u32,
    pub minor: u32,
    pub embedded: bool,
}

/// GL 3.0 and GLES 3.0 are both enough for batched meshes.
pub fn check_gl(info: Option<GlInfo>) -> Result<GlInfo, BackendError> {
    let info = info.ok_or(BackendError::NoGlContext)?;
    if info.major < 3 {
        return Err(BackendError::UnsupportedGl {
            major: info.major,
            minor: info.minor,
            embedded: info.embedded,
        });
    }
    Ok(info)
}

pub fn probe_gl(cc: &eframe::CreationContext<'_>) -> Option<GlInfo> {
    use eframe::glow::HasContext;

    let gl = cc.gl.as_ref()?;
    let version = gl.version();
    Some(GlInfo {
        major: version.major,
        minor: version.minor,
        embedded: version.is_embedded,
    })
}

pub trait SceneRenderer {
    fn kind(&self) -> BackendKind;

    fn paint(&mut self, ui: &mut Ui, rect: Rect, scene: &SceneIntent);

    /// Frees textures and buffers. The renderer is not used afterwards.
    fn release(&mut self, ctx: &Context);
}

/// Builds the renderer for `choice`, falling back to the canvas whenever the
/// GPU path cannot be constructed.
pub fn select_renderer(choice: BackendChoice, gl: Option<GlInfo>) -> Box<dyn SceneRenderer> {
    if choice == BackendChoice::Canvas {
        info!("using canvas renderer (forced)");
        return Box::new(CanvasRenderer::default());
    }

    match GpuRenderer::new(gl) {
        Ok(renderer) => {
            info!(?gl, "using GPU renderer");
            Box::new(renderer)
        }
        Err(error) => {
            warn!(%error, ?choice, "GPU renderer unavailable, falling back to canvas");
            Box::new(CanvasRenderer::default())
        }
    }
}

/// One live renderer bound to a viewport. Ending it consumes the handle.
pub struct RendererSession {
    id: u64,
    renderer: Box<dyn SceneRenderer>,
}

impl RendererSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> BackendKind {
        self.renderer.kind()
    }

    pub fn paint(&mut self, ui: &mut Ui, rect: Rect, scene: &SceneIntent) {
        self.renderer.paint(ui, rect, scene);
    }

    fn end(mut self, ctx: &Context) {
        self.renderer.release(ctx);
        debug!(session = self.id, kind = ?self.renderer.kind(), "renderer session ended");
    }
}

/// Holds at most one [`RendererSession`].
#[derive(Default)]
pub struct ViewportSlot {
    current: Option<RendererSession>,
    started: u64,
}

impl ViewportSlot {
    /// Ends the live session, if any, then installs `renderer`.
    pub fn start_session(&mut self, ctx: &Context, renderer: Box<dyn SceneRenderer>) -> &mut RendererSession {
        self.end_session(ctx);
        self.started += 1;
        debug!(session = self.started, kind = ?renderer.kind(), "renderer session started");
        self.current.insert(RendererSession {
            id: self.started,
            renderer,
        })
    }

    pub fn end_session(&mut self, ctx: &Context) {
        if let Some(session) = self.current.take() {
            session.end(ctx);
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut RendererSession> {
        self.current.as_mut()
    }

    pub fn kind(&self) -> Option<BackendKind> {
        self.current.as_ref().map(RendererSession::kind)
    }
}

/// Text layers are drawn with egui's painter by both backends.
pub(super) fn paint_text_layers(painter: &Painter, rect: Rect, scene: &SceneIntent) {
    for cluster in &scene.clusters {
        painter.text(
            cluster.position,
            Align2::CENTER_CENTER,
            &cluster.label,
            FontId::proportional(12.0),
            scene.label_color,
        );
    }

    for (node, label) in scene.labels() {
        painter.text(
            node.position + vec2(node.radius + 5.0, 0.0),
            Align2::LEFT_CENTER,
            label,
            FontId::proportional(12.0),
            scene.label_color,
        );
    }

    for (line, text) in scene.overlay.iter().enumerate() {
        painter.text(
            rect.left_top() + vec2(10.0, 10.0 + line as f32 * 18.0),
            Align2::LEFT_TOP,
            text,
            FontId::proportional(13.0),
            scene.label_color,
        );
    }
}
