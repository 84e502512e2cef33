use eframe::egui::Rect;

use super::camera::CameraState;

/// Monotonic counter stamped on every camera animation, defocus timer and
/// annotation request. Completions carrying an older value are stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn bump(&mut self) -> Self {
        self.0 += 1;
        *self
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn from_value(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    pub degree_floor: usize,
    /// Edges with a confidence below this are hidden; unscored edges never are.
    pub confidence_floor: f32,
    pub only_novel: bool,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            degree_floor: 0,
            confidence_floor: 0.0,
            only_novel: false,
        }
    }
}

impl FilterParams {
    pub fn sanitized(self) -> Self {
        Self {
            confidence_floor: if self.confidence_floor.is_finite() {
                self.confidence_floor.clamp(0.0, 1.0)
            } else {
                0.0
            },
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LodMode {
    #[default]
    Detail,
    Cluster,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusState {
    pub focused: Option<usize>,
    pub hovered: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusPhase {
    Idle,
    Previewing(usize),
    Focused(usize),
}

impl FocusState {
    pub fn phase(&self) -> FocusPhase {
        match (self.focused, self.hovered) {
            (Some(node), _) => FocusPhase::Focused(node),
            (None, Some(node)) => FocusPhase::Previewing(node),
            (None, None) => FocusPhase::Idle,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewState {
    pub filter: FilterParams,
    pub lod: LodMode,
    pub focus: FocusState,
    pub camera: CameraState,
    pub show_all_edges: bool,
    pub viewport: Rect,
    pub generation: Generation,
}

impl ViewState {
    pub fn new(camera: CameraState, viewport: Rect) -> Self {
        Self {
            filter: FilterParams::default(),
            lod: LodMode::Detail,
            focus: FocusState::default(),
            camera,
            show_all_edges: false,
            viewport,
            generation: Generation::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_only_grows() {
        let mut generation = Generation::default();
        let first = generation.bump();
        let second = generation.bump();
        assert!(second > first);
        assert_eq!(generation, second);
    }

    #[test]
    fn phase_prefers_focus_over_hover() {
        let state = FocusState {
            focused: Some(2),
            hovered: Some(5),
        };
        assert_eq!(state.phase(), FocusPhase::Focused(2));
        assert_eq!(FocusState::default().phase(), FocusPhase::Idle);
    }

    #[test]
    fn confidence_floor_is_clamped() {
        let params = FilterParams {
            confidence_floor: 3.0,
            ..FilterParams::default()
        };
        assert_eq!(params.sanitized().confidence_floor, 1.0);
    }
}
