mod types;

pub use types::{MetricsSnapshot, QueryRecord, QuerySource};

use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_RECENT_QUERIES: usize = 20;

/// Counters for the cache and fallback paths, shared across clones.
pub struct QueryMetrics {
    inner: Arc<Mutex<MetricsState>>,
}

#[derive(Default)]
struct MetricsState {
    recent_queries: Vec<QueryRecord>,
    query_count: u64,
    cache_hits: u64,
    cache_misses: u64,
    precomputed_hits: u64,
    live_fallbacks: u64,
    dropped_anomalous_stays: u64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_queries: Vec::with_capacity(MAX_RECENT_QUERIES),
                ..MetricsState::default()
            })),
        }
    }

    pub async fn record_cache_hit(&self) {
        self.inner.lock().await.cache_hits += 1;
    }

    pub async fn record_cache_miss(&self) {
        self.inner.lock().await.cache_misses += 1;
    }

    pub async fn record_dropped_stays(&self, count: usize) {
        if count > 0 {
            self.inner.lock().await.dropped_anomalous_stays += count as u64;
        }
    }

    /// Log a finished query; store and live sources also bump their counters.
    pub async fn record_query(&self, record: QueryRecord) {
        let mut state = self.inner.lock().await;

        state.query_count += 1;

        match record.source {
            QuerySource::Precomputed => state.precomputed_hits += 1,
            QuerySource::Live => state.live_fallbacks += 1,
            QuerySource::TtlCache | QuerySource::Gaze => {}
        }

        state.recent_queries.push(record);

        if state.recent_queries.len() > MAX_RECENT_QUERIES {
            state.recent_queries.remove(0);
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let state = self.inner.lock().await;

        MetricsSnapshot {
            recent_queries: state.recent_queries.clone(),
            query_count: state.query_count,
            cache_hits: state.cache_hits,
            cache_misses: state.cache_misses,
            precomputed_hits: state.precomputed_hits,
            live_fallbacks: state.live_fallbacks,
            dropped_anomalous_stays: state.dropped_anomalous_stays,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        *state = MetricsState::default();
    }
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QueryMetrics {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(source: QuerySource) -> QueryRecord {
        QueryRecord {
            timestamp: Utc::now(),
            query: "timeline".to_string(),
            image_id: Some(1),
            participant_id: Some(2),
            source,
            elapsed_ms: 3,
        }
    }

    #[tokio::test]
    async fn keeps_only_recent_queries() {
        let metrics = QueryMetrics::new();
        for _ in 0..25 {
            metrics.record_query(record(QuerySource::Live)).await;
        }
        metrics.record_query(record(QuerySource::Precomputed)).await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.recent_queries.len(), MAX_RECENT_QUERIES);
        assert_eq!(snapshot.query_count, 26);
        assert_eq!(snapshot.live_fallbacks, 25);
        assert_eq!(snapshot.precomputed_hits, 1);
    }

    #[tokio::test]
    async fn clones_share_state_and_reset_clears() {
        let metrics = QueryMetrics::new();
        let shared = metrics.clone();
        shared.record_cache_hit().await;
        shared.record_cache_miss().await;
        shared.record_dropped_stays(2).await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!((snapshot.cache_hits, snapshot.cache_misses), (1, 1));
        assert_eq!(snapshot.dropped_anomalous_stays, 2);

        metrics.reset().await;
        assert_eq!(shared.get_snapshot().await.cache_hits, 0);
    }
}
