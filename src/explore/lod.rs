//! Zoom-driven level of detail.

use crate::config::RuntimeConfig;

use super::state::LodMode;

pub fn mode_for(ratio: f32, cluster_ratio: f32) -> LodMode {
    if ratio > cluster_ratio {
        LodMode::Cluster
    } else {
        LodMode::Detail
    }
}

/// Screen radius in pixels for a node of `degree` at camera `ratio`.
pub fn node_radius(base: f32, degree: usize, ratio: f32) -> f32 {
    (base * (1.0 + (degree as f32).sqrt()) * ratio.max(f32::EPSILON).powf(-0.4)).clamp(1.5, 40.0)
}

pub fn cluster_radius(size: f32, ratio: f32) -> f32 {
    (size * 1.5 * ratio.max(f32::EPSILON).powf(-0.4)).clamp(3.0, 90.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LodChange {
    pub mode_changed: bool,
    pub radii_changed: bool,
}

pub struct LodController {
    cluster_ratio: f32,
    edge_ratio: f32,
    base_radius: f32,
    mode: LodMode,
    last_ratio: Option<f32>,
    radii: Vec<f32>,
}

impl LodController {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            cluster_ratio: config.cluster_ratio,
            edge_ratio: config.edge_ratio,
            base_radius: config.node_base_radius,
            mode: LodMode::Detail,
            last_ratio: None,
            radii: Vec::new(),
        }
    }

    pub fn mode(&self) -> LodMode {
        self.mode
    }

    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    pub fn edges_suppressed(&self, ratio: f32) -> bool {
        ratio > self.edge_ratio
    }

    /// Re-derives the mode and per-node radii. Does nothing when `ratio` and
    /// the node count are unchanged.
    pub fn update(&mut self, ratio: f32, degrees: &[usize]) -> LodChange {
        if self.last_ratio == Some(ratio) && self.radii.len() == degrees.len() {
            return LodChange::default();
        }
        self.last_ratio = Some(ratio);

        let mode = mode_for(ratio, self.cluster_ratio);
        let mode_changed = mode != self.mode;
        self.mode = mode;

        self.radii.clear();
        self.radii
            .extend(degrees.iter().map(|&degree| node_radius(self.base_radius, degree, ratio)));

        LodChange {
            mode_changed,
            radii_changed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_switches_only_when_crossing_threshold() {
        let mut lod = LodController::new(&RuntimeConfig::default());
        let degrees = [1, 4];

        assert!(!lod.update(1.0, &degrees).mode_changed);
        assert!(!lod.update(2.0, &degrees).mode_changed);
        assert!(lod.update(2.5, &degrees).mode_changed);
        assert_eq!(lod.mode(), LodMode::Cluster);
        assert!(!lod.update(3.0, &degrees).mode_changed);
        assert!(lod.update(2.4, &degrees).mode_changed);
        assert_eq!(lod.mode(), LodMode::Detail);
    }

    #[test]
    fn unchanged_ratio_skips_recompute() {
        let mut lod = LodController::new(&RuntimeConfig::default());
        assert!(lod.update(1.0, &[1]).radii_changed);
        assert_eq!(lod.update(1.0, &[1]), LodChange::default());
    }

    #[test]
    fn radius_shrinks_when_zooming_out_and_is_clamped() {
        assert!(node_radius(2.0, 9, 0.5) > node_radius(2.0, 9, 2.0));
        assert_eq!(node_radius(2.0, 10_000, 0.01), 40.0);
        assert_eq!(node_radius(2.0, 0, 1000.0), 1.5);
        assert_eq!(node_radius(2.0, 0, 1.0), 2.0);
        assert_eq!(node_radius(2.0, 9, 1.0), 8.0);
    }

    #[test]
    fn edges_suppressed_above_edge_ratio() {
        let lod = LodController::new(&RuntimeConfig::default());
        assert!(!lod.edges_suppressed(3.0));
        assert!(lod.edges_suppressed(3.3));
    }
}
