pub mod classifier;
pub mod grid;

pub use classifier::{sample_region, LabelSource, PatchLabelMap, SemanticClassifier, UNKNOWN_REGION};
pub use grid::{PatchGrid, PatchSize};
