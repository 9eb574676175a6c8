use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Detection parameters a block was precomputed with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecomputeParams {
    pub velocity_threshold: f64,
    pub min_duration: f64,
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub image_id: i64,
    pub participant_id: i64,
    pub fixation_count: usize,
    pub params: PrecomputeParams,
    pub populated_at: DateTime<Utc>,
}

/// Distinct patches hit at one patch size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchUsage {
    pub patch_size: u32,
    pub unique_patches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub image_id: i64,
    pub total_fixations: usize,
    pub participants: usize,
    pub avg_duration: f64,
    pub median_duration: f64,
    pub fixations_per_participant: BTreeMap<i64, usize>,
    pub patch_usage: Vec<PatchUsage>,
}
