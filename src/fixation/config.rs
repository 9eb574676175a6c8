/// Thresholds for velocity-based (I-VT) fixation detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationConfig {
    /// Samples moving slower than this (px/s) are fixation candidates
    pub velocity_threshold: f64,

    /// Fixation clusters shorter than this (s) are discarded
    pub min_duration: f64,
}

impl Default for FixationConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 1.15,
            min_duration: 0.0,
        }
    }
}
