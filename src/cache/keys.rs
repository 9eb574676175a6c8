use crate::models::DataKind;
use crate::semantic::PatchSize;

/// One participant's timeline on one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineKey {
    pub image_id: i64,
    pub participant_id: i64,
    pub patch_size: PatchSize,
    pub kind: DataKind,
}

/// Every participant's timeline on one image, optionally capped to the first `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageTimelinesKey {
    pub image_id: i64,
    pub patch_size: PatchSize,
    pub limit: Option<usize>,
    pub kind: DataKind,
}
