use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which path answered a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    TtlCache,
    Precomputed,
    Live,
    /// Built from raw samples; the fixation store is never consulted.
    Gaze,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub image_id: Option<i64>,
    pub participant_id: Option<i64>,
    pub source: QuerySource,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub recent_queries: Vec<QueryRecord>,
    pub query_count: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub precomputed_hits: u64,
    pub live_fallbacks: u64,
    pub dropped_anomalous_stays: u64,
}
