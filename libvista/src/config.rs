use serde::{Deserialize, Serialize};

/// Milliseconds as delivered by host input events. The core never samples a
/// clock itself; every throttle/debounce decision works on these values.
pub type Millis = f64;

/// Tuning knobs for the viewer. The defaults are the production values; none
/// of them is an invariant, so hosts may override any field (the CLI loads
/// overrides from a TOML file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerTunables {
    /// Repeated navigation triggers inside this window collapse to the first
    pub navigation_throttle_ms: Millis,

    /// Horizontal travel a touch must cover before release counts as a swipe
    pub swipe_threshold_px: f32,

    /// Quiet period after interaction settles before a resolution upgrade is
    /// considered
    pub upgrade_debounce_ms: Millis,

    /// How long the interacting flags linger after a gesture ends
    pub interaction_settle_ms: Millis,

    /// Minimum absolute width gain (pixels) for an upgrade swap
    pub upgrade_min_gain_px: u32,

    /// Minimum relative width gain for an upgrade swap
    pub upgrade_min_gain_ratio: f32,

    /// Headroom multiplier on the zoom-implied target width
    pub upgrade_headroom: f32,

    /// Maximum simultaneous prefetch loads
    pub prefetch_concurrency: usize,

    /// Unique target indices admitted per enqueue call
    pub prefetch_index_fanout: usize,

    /// Neighbor images warmed per navigation trigger
    pub prefetch_neighbors: usize,

    /// Target width for card/grid thumbnails
    pub grid_target_width: u32,

    /// Target width for the primary hero image
    pub detail_target_width: u32,

    /// Wheel zoom response rate
    pub wheel_zoom_rate: f32,

    /// Wheel zoom response rate with the zoom modifier key held
    pub wheel_zoom_rate_modified: f32,
}

impl Default for ViewerTunables {
    fn default() -> Self {
        Self {
            navigation_throttle_ms: 300.0,
            swipe_threshold_px: 50.0,
            upgrade_debounce_ms: 70.0,
            interaction_settle_ms: 90.0,
            upgrade_min_gain_px: 140,
            upgrade_min_gain_ratio: 0.12,
            upgrade_headroom: 1.1,
            prefetch_concurrency: crate::PREFETCH_CONCURRENCY,
            prefetch_index_fanout: 2,
            prefetch_neighbors: 2,
            grid_target_width: crate::GRID_TARGET_WIDTH,
            detail_target_width: crate::DETAIL_TARGET_WIDTH,
            wheel_zoom_rate: 0.0022,
            wheel_zoom_rate_modified: 0.0042,
        }
    }
}
