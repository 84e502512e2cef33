//! Viewport math shared by both renderers: the world/screen transform, wheel
//! zoom, panning, picking and eased camera animation.

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

/// `ratio` is world units per screen pixel, so values above 1 are zoomed out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub center: Vec2,
    pub ratio: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            ratio: 1.0,
        }
    }
}

impl CameraState {
    pub fn world_to_screen(&self, viewport: Rect, world: Vec2) -> Pos2 {
        viewport.center() + (world - self.center) / self.ratio
    }

    pub fn screen_to_world(&self, viewport: Rect, screen: Pos2) -> Vec2 {
        self.center + (screen - viewport.center()) * self.ratio
    }

    /// Scales the ratio by `factor` while keeping the world point under
    /// `pointer` fixed on screen.
    pub fn zoom_at(&mut self, viewport: Rect, pointer: Pos2, factor: f32, min_ratio: f32, max_ratio: f32) {
        let anchor = self.screen_to_world(viewport, pointer);
        self.ratio = (self.ratio * factor).clamp(min_ratio, max_ratio);
        self.center = anchor - (pointer - viewport.center()) * self.ratio;
    }

    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.center -= screen_delta * self.ratio;
    }

    /// Keeps the camera centre inside `bounds`.
    pub fn clamp_center(&mut self, bounds: Rect) {
        self.center = vec2(
            self.center.x.clamp(bounds.min.x, bounds.max.x),
            self.center.y.clamp(bounds.min.y, bounds.max.y),
        );
    }

    /// Camera that fits `frame` in `viewport`, padded and grown to at least
    /// `min_extent` on each axis.
    pub fn fit(frame: Rect, viewport: Rect, padding: f32, min_extent: f32, min_ratio: f32, max_ratio: f32) -> Self {
        let size = frame.size() * (1.0 + padding * 2.0);
        let size = vec2(size.x.max(min_extent), size.y.max(min_extent));
        let view = viewport.size().max(vec2(1.0, 1.0));
        let ratio = (size.x / view.x).max(size.y / view.y).clamp(min_ratio, max_ratio);

        Self {
            center: frame.center().to_vec2(),
            ratio,
        }
    }

    /// Interpolates toward `to`. The ratio moves geometrically so zooms feel
    /// uniform; `t >= 1` lands exactly on `to`.
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        if t >= 1.0 {
            return *to;
        }
        let t = t.max(0.0);
        let ratio = (self.ratio.ln() + (to.ratio.ln() - self.ratio.ln()) * t).exp();

        Self {
            center: self.center + (to.center - self.center) * t,
            ratio,
        }
    }
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Bounding box of `points`, or `None` when there are none.
pub fn bounds_of(points: impl IntoIterator<Item = Vec2>) -> Option<Rect> {
    let mut iter = points.into_iter().filter(|point| point.x.is_finite() && point.y.is_finite());
    let first = iter.next()?;
    let mut bounds = Rect::from_min_max(first.to_pos2(), first.to_pos2());
    for point in iter {
        bounds.extend_with(point.to_pos2());
    }
    Some(bounds)
}

/// Shifts `frame` so it lies inside `bounds` where it fits.
pub fn clamp_frame(frame: Rect, bounds: Rect) -> Rect {
    let shift = |min: f32, max: f32, lo: f32, hi: f32| {
        if max - min >= hi - lo {
            (lo + hi) * 0.5 - (min + max) * 0.5
        } else if min < lo {
            lo - min
        } else if max > hi {
            hi - max
        } else {
            0.0
        }
    };

    let dx = shift(frame.min.x, frame.max.x, bounds.min.x, bounds.max.x);
    let dy = shift(frame.min.y, frame.max.y, bounds.min.y, bounds.max.y);
    frame.translate(vec2(dx, dy))
}

/// Nearest candidate within `radius_px` of `pointer`.
pub fn pick_nearest(
    camera: &CameraState,
    viewport: Rect,
    pointer: Pos2,
    radius_px: f32,
    candidates: impl IntoIterator<Item = (usize, Vec2)>,
) -> Option<usize> {
    let world = camera.screen_to_world(viewport, pointer);
    let limit = radius_px * camera.ratio;

    candidates
        .into_iter()
        .map(|(index, position)| (index, (position - world).length()))
        .filter(|(_, distance)| *distance <= limit)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

#[derive(Clone, Copy, Debug)]
struct Flight {
    from: CameraState,
    to: CameraState,
    started_at: f64,
    duration: f64,
    token: u64,
}

pub struct AnimationStep {
    pub camera: CameraState,
    /// Token of an animation that reached its end on this step.
    pub finished: Option<u64>,
}

/// At most one eased flight at a time; starting a new one supersedes the
/// previous without reporting it finished.
#[derive(Default)]
pub struct CameraAnimator {
    flight: Option<Flight>,
}

impl CameraAnimator {
    pub fn start(&mut self, from: CameraState, to: CameraState, now: f64, duration: f64, token: u64) {
        self.flight = Some(Flight {
            from,
            to,
            started_at: now,
            duration: duration.max(0.0),
            token,
        });
    }

    pub fn is_running(&self) -> bool {
        self.flight.is_some()
    }

    /// Stops the flight in place and returns its token.
    pub fn interrupt(&mut self) -> Option<u64> {
        self.flight.take().map(|flight| flight.token)
    }

    pub fn step(&mut self, now: f64) -> Option<AnimationStep> {
        let flight = self.flight?;
        let progress = if flight.duration <= f64::EPSILON {
            1.0
        } else {
            ((now - flight.started_at) / flight.duration).clamp(0.0, 1.0) as f32
        };

        let camera = flight.from.lerp(&flight.to, ease_in_out_cubic(progress));
        let finished = if progress >= 1.0 {
            self.flight = None;
            Some(flight.token)
        } else {
            None
        };

        Some(AnimationStep { camera, finished })
    }
}

pub fn origin_viewport(width: f32, height: f32) -> Rect {
    Rect::from_min_size(pos2(0.0, 0.0), vec2(width, height))
}
