pub mod dwell;
pub mod matrix;
pub mod patches;
pub mod ratios;

pub use dwell::{dwell_from_fixations, dwell_from_samples, DwellTable};
pub use matrix::{aggregate, density, normalize_min_max, DensityAggregator};
pub use patches::patch_attention_matrix;
pub use ratios::AreaRatios;
