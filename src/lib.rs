//! Gaze attention analytics.
//!
//! Turns raw eye-tracking samples into fixation events, semantic attention timelines
//! and class density heatmaps, with a SQLite-backed fixation store and a TTL cache in
//! front of the live algorithms.

pub mod cache;
pub mod db;
pub mod density;
pub mod error;
pub mod fixation;
pub mod metrics;
pub mod models;
pub mod semantic;
pub mod service;
pub mod settings;
pub mod source;
pub mod timeline;
pub mod utils;

pub use cache::{PrecomputedStore, TtlCache};
pub use density::{AreaRatios, DensityAggregator};
pub use error::{AttentionError, ErrorReport, Outcome, Result};
pub use fixation::{FixationConfig, FixationDetector};
pub use metrics::QueryMetrics;
pub use semantic::{
    LabelSource, PatchGrid, PatchLabelMap, PatchSize, SemanticClassifier, UNKNOWN_REGION,
};
pub use service::{AttentionService, HeatmapOptions};
pub use settings::{AnalysisSettings, SettingsStore};
pub use source::{GazeSource, SampleTable};
pub use timeline::{TimelineBuilder, TimelineConfig};
pub use utils::json::to_json_value;
pub use utils::logging::init_logging;
