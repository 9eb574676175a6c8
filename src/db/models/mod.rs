pub mod precompute;
pub mod stored_fixation;

pub use precompute::{BlockRecord, ImageStats, PatchUsage, PrecomputeParams};
pub use stored_fixation::StoredFixation;
