//! Timeline data models: region stays, transitions and per-region aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Outcome;
use crate::models::FixationSource;

/// One contiguous dwell inside a single semantic region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStay {
    pub region: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    /// Fixations or raw samples merged into this stay.
    pub member_count: usize,
    pub centroid_x: f64,
    pub centroid_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from_region: String,
    pub to_region: String,
    /// Start of the stay being entered.
    pub time: f64,
    /// Negative only when the two stays overlap.
    pub gap_duration: f64,
}

impl Transition {
    pub fn is_overlapping(&self) -> bool {
        self.gap_duration < 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub visit_count: usize,
    pub total_duration: f64,
    pub member_count: usize,
    pub first_visit: f64,
    pub last_visit: f64,
    /// Running pairwise average of stay centroids, not a duration-weighted mean.
    pub mean_centroid_x: f64,
    pub mean_centroid_y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            duration: (end - start).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineResult {
    pub sequence: Vec<Transition>,
    pub region_stats: BTreeMap<String, RegionStats>,
    pub timeline: Vec<RegionStay>,
    pub total_transitions: usize,
    pub unique_regions: usize,
    pub time_range: TimeRange,
    pub dropped_short: usize,
    pub dropped_anomalous: usize,
    pub overlapping_transitions: usize,
}

impl TimelineResult {
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Copy with every timestamp shifted so that `origin` becomes 0.
    pub fn relative_to(&self, origin: f64) -> TimelineResult {
        let mut shifted = self.clone();
        for stay in &mut shifted.timeline {
            stay.start_time -= origin;
            stay.end_time -= origin;
        }
        for transition in &mut shifted.sequence {
            transition.time -= origin;
        }
        for stats in shifted.region_stats.values_mut() {
            stats.first_visit -= origin;
            stats.last_visit -= origin;
        }
        shifted.time_range = TimeRange::new(
            self.time_range.start - origin,
            self.time_range.end - origin,
        );
        shifted
    }
}

/// Whether timelines and heatmaps are built from raw samples or detected fixations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Gaze,
    Fixations,
}

impl Default for DataKind {
    fn default() -> Self {
        DataKind::Fixations
    }
}

/// Timelines for every participant of one image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageTimelines {
    pub image_id: i64,
    pub patch_size: u32,
    pub kind: DataKind,
    pub participants: Vec<i64>,
    pub participants_data: BTreeMap<i64, Outcome<ParticipantTimeline>>,
    pub total_segments: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantTimeline {
    pub participant_id: i64,
    pub source: FixationSource,
    #[serde(flatten)]
    pub result: TimelineResult,
}
