pub mod builder;
pub mod config;
pub mod stats;

pub use builder::{build_timeline, timeline_from_fixations, timeline_from_samples, TimelineBuilder};
pub use config::TimelineConfig;
pub use stats::accumulate_region_stats;
