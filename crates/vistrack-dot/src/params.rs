use serde::{Deserialize, Serialize};

/// Configuration for [`crate::DotTracker`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotParams {
    /// Largest accepted region, in pixels. Bigger regions mean the dot has
    /// merged with the background.
    pub max_region_size: usize,
    /// Smallest accepted region, in pixels.
    pub min_region_size: usize,
    /// Accumulate raw image moments while growing the region.
    pub compute_moments: bool,
    /// Forward every accepted pixel to the display sink, when one is given.
    pub graphics: bool,
    /// Initial intensity threshold, used until the first click or `track`.
    pub threshold: u8,
    /// Initial lower bound of the threshold.
    pub min_threshold: u8,
    /// Threshold as a fraction of the seed pixel intensity.
    pub threshold_ratio: f64,
    /// Lower threshold bound as a fraction of the seed pixel intensity.
    pub min_threshold_ratio: f64,
    /// First spiral search step, in pixels.
    pub search_radius_min: usize,
    /// Last spiral search step, in pixels.
    pub search_radius_max: usize,
}

impl Default for DotParams {
    fn default() -> Self {
        Self {
            max_region_size: 10_000,
            min_region_size: 5,
            compute_moments: false,
            graphics: false,
            threshold: 200,
            min_threshold: 200,
            threshold_ratio: 0.8,
            min_threshold_ratio: 0.6,
            search_radius_min: 2,
            search_radius_max: 25,
        }
    }
}

impl DotParams {
    /// Thresholds `(threshold, min_threshold)` derived from a seed intensity.
    ///
    /// Both products are truncated; `threshold` never drops below `min_threshold`.
    pub fn thresholds_for(&self, seed: u8) -> (u8, u8) {
        let seed = seed as f64;
        let min_threshold = (seed * self.min_threshold_ratio) as u8;
        let threshold = ((seed * self.threshold_ratio) as u8).max(min_threshold);
        (threshold, min_threshold)
    }
}
