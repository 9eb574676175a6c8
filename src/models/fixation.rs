use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::TimedPoint;

/// A contiguous low-velocity run of samples for one participant on one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationEvent {
    pub participant_id: i64,
    pub image_id: i64,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub x_centroid: f64,
    pub y_centroid: f64,
    pub point_count: usize,
}

impl TimedPoint for FixationEvent {
    fn start(&self) -> f64 {
        self.start
    }

    fn end(&self) -> f64 {
        self.end
    }

    fn position(&self) -> (f64, f64) {
        (self.x_centroid, self.y_centroid)
    }
}

/// Fixation with the semantic region and grid cell it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFixation {
    #[serde(flatten)]
    pub fixation: FixationEvent,
    pub region: String,
    pub patch_index: Option<usize>,
}

impl TimedPoint for LabeledFixation {
    fn start(&self) -> f64 {
        self.fixation.start
    }

    fn end(&self) -> f64 {
        self.fixation.end
    }

    fn position(&self) -> (f64, f64) {
        self.fixation.position()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixationStats {
    pub total_fixations: usize,
    pub participants: usize,
    pub avg_duration: f64,
    pub median_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub duration_std: f64,
    pub fixations_per_participant: BTreeMap<i64, usize>,
}

/// Where a set of fixations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixationSource {
    Precomputed,
    Live,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixationSummary {
    pub image_id: i64,
    pub participant_id: Option<i64>,
    pub patch_size: u32,
    pub source: FixationSource,
    pub fixations: Vec<LabeledFixation>,
    pub stats: FixationStats,
}
