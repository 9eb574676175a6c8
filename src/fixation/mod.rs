pub mod algorithm;
pub mod config;
pub mod stats;

pub use algorithm::{
    detect_fixations, fixations_in_bounds, group_samples, FixationDetector, PixelBounds,
};
pub use config::FixationConfig;
pub use stats::fixation_stats;
