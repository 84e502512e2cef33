//! Hover and focus transitions.
//!
//! [`FocusMachine::handle`] is the single place focus state changes. It never
//! touches the camera directly; it returns [`Effect`]s that the session
//! carries out.

use tracing::trace;

use super::camera::CameraState;
use super::state::{Generation, ViewState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FocusEvent {
    PointerEnter(usize),
    PointerLeave,
    Click(usize),
    ClickEmpty,
    SearchJump(usize),
    Tick(f64),
    AnimationDone(Generation),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraTarget {
    /// Frame the node and its visible neighbours.
    Frame(usize),
    Restore(CameraState),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    AnimateCamera {
        target: CameraTarget,
        generation: Generation,
    },
    RequestAnnotation {
        node: usize,
        generation: Generation,
    },
    CancelAnnotation,
    Repaint,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingDefocus {
    /// Set by the first tick after the click.
    due_at: Option<f64>,
    generation: Generation,
}

#[derive(Debug)]
pub struct FocusMachine {
    defocus_delay: f64,
    snapshot: Option<CameraState>,
    pending_defocus: Option<PendingDefocus>,
    labels_ready: bool,
}

impl FocusMachine {
    pub fn new(defocus_delay: f64) -> Self {
        Self {
            defocus_delay,
            snapshot: None,
            pending_defocus: None,
            labels_ready: false,
        }
    }

    /// Labels on the focused neighbourhood appear once the focus flight ends.
    pub fn labels_ready(&self) -> bool {
        self.labels_ready
    }

    pub fn has_pending_defocus(&self) -> bool {
        self.pending_defocus.is_some()
    }

    pub fn snapshot(&self) -> Option<CameraState> {
        self.snapshot
    }

    pub fn handle(&mut self, event: FocusEvent, view: &mut ViewState) -> Vec<Effect> {
        match event {
            FocusEvent::PointerEnter(node) => {
                if view.focus.hovered == Some(node) {
                    return Vec::new();
                }
                view.focus.hovered = Some(node);
                vec![Effect::Repaint]
            }
            FocusEvent::PointerLeave => {
                if view.focus.hovered.take().is_none() {
                    return Vec::new();
                }
                vec![Effect::Repaint]
            }
            FocusEvent::Click(node) | FocusEvent::SearchJump(node) => self.focus(node, view),
            FocusEvent::ClickEmpty => {
                if view.focus.focused.is_none() {
                    return Vec::new();
                }
                self.pending_defocus = Some(PendingDefocus {
                    due_at: None,
                    generation: view.generation,
                });
                vec![Effect::Repaint]
            }
            FocusEvent::Tick(now) => self.tick(now, view),
            FocusEvent::AnimationDone(generation) => {
                if generation != view.generation {
                    trace!(stale = generation.value(), current = view.generation.value(), "dropping stale animation end");
                    return Vec::new();
                }
                if view.focus.focused.is_some() && !self.labels_ready {
                    self.labels_ready = true;
                    return vec![Effect::Repaint];
                }
                Vec::new()
            }
        }
    }

    fn focus(&mut self, node: usize, view: &mut ViewState) -> Vec<Effect> {
        if view.focus.focused == Some(node) {
            return Vec::new();
        }

        if view.focus.focused.is_none() {
            self.snapshot = Some(view.camera);
        }
        view.focus.focused = Some(node);
        self.pending_defocus = None;
        self.labels_ready = false;
        let generation = view.generation.bump();

        vec![
            Effect::AnimateCamera {
                target: CameraTarget::Frame(node),
                generation,
            },
            Effect::RequestAnnotation { node, generation },
        ]
    }

    fn tick(&mut self, now: f64, view: &mut ViewState) -> Vec<Effect> {
        let Some(pending) = self.pending_defocus.as_mut() else {
            return Vec::new();
        };

        if pending.generation != view.generation {
            trace!(stale = pending.generation.value(), "dropping stale defocus");
            self.pending_defocus = None;
            return Vec::new();
        }

        let due_at = *pending.due_at.get_or_insert(now + self.defocus_delay);
        if now < due_at {
            return vec![Effect::Repaint];
        }

        self.pending_defocus = None;
        self.labels_ready = false;
        view.focus.focused = None;
        let generation = view.generation.bump();

        let mut effects = vec![Effect::CancelAnnotation];
        if let Some(snapshot) = self.snapshot.take() {
            effects.push(Effect::AnimateCamera {
                target: CameraTarget::Restore(snapshot),
                generation,
            });
        }
        effects
    }
}
