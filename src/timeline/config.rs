/// Stay-acceptance window for timeline building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineConfig {
    /// Stays shorter than this (s) are dropped, except the first one of a stream
    pub min_stay_duration: f64,

    /// Stays longer than this (s) are treated as tracking anomalies and dropped
    pub max_stay_duration: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_stay_duration: 0.2,
            max_stay_duration: 5.0,
        }
    }
}
