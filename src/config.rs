use chrono::Duration;

/// Thresholds and timings for the exploration runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    /// Camera ratio above which clusters replace nodes.
    pub cluster_ratio: f32,
    /// Camera ratio above which no edges are drawn.
    pub edge_ratio: f32,
    pub node_base_radius: f32,
    pub min_ratio: f32,
    pub max_ratio: f32,
    pub pick_radius_px: f32,
    pub defocus_delay_secs: f64,
    pub animation_secs: f64,
    /// Padding around a focus frame, as a fraction of its extent.
    pub frame_padding: f32,
    /// Smallest world extent a focus frame may have.
    pub min_frame_extent: f32,
    pub annotation_ttl: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cluster_ratio: 2.4,
            edge_ratio: 3.2,
            node_base_radius: 2.0,
            min_ratio: 0.05,
            max_ratio: 400.0,
            pick_radius_px: 10.0,
            defocus_delay_secs: 0.18,
            animation_secs: 0.6,
            frame_padding: 0.25,
            min_frame_extent: 240.0,
            annotation_ttl: Duration::days(7),
        }
    }
}
