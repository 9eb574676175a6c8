//! Query façade tying the source, the fixation store and the algorithms together.
//!
//! Every request tries the TTL cache, then the precomputed store, then live detection.

mod heatmaps;
mod timelines;

pub use heatmaps::HeatmapOptions;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use crate::cache::{ImageTimelinesKey, PrecomputedStore, TimelineKey, TtlCache};
use crate::db::models::PrecomputeParams;
use crate::error::{AttentionError, Result};
use crate::fixation::{fixation_stats, FixationDetector};
use crate::metrics::{QueryMetrics, QueryRecord, QuerySource};
use crate::models::{
    FixationSource, FixationSummary, ImageTimelines, LabeledFixation, ParticipantTimeline,
};
use crate::semantic::{LabelSource, PatchSize, SemanticClassifier};
use crate::settings::AnalysisSettings;
use crate::source::GazeSource;
use crate::{log_debug, log_info};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub stored_fixations: usize,
    pub cached_timelines: usize,
}

pub struct AttentionService {
    source: Arc<dyn GazeSource>,
    store: Option<PrecomputedStore>,
    labels: Arc<dyn LabelSource>,
    settings: AnalysisSettings,
    metrics: QueryMetrics,
    timelines: TtlCache<TimelineKey, ParticipantTimeline>,
    image_timelines: TtlCache<ImageTimelinesKey, ImageTimelines>,
}

impl AttentionService {
    pub fn new(
        source: Arc<dyn GazeSource>,
        store: Option<PrecomputedStore>,
        labels: Arc<dyn LabelSource>,
        settings: AnalysisSettings,
        metrics: QueryMetrics,
    ) -> Result<Self> {
        settings.validate()?;
        let ttl = settings.cache_ttl();

        log_info!(
            "attention service ready (store: {}, ttl: {}s)",
            if store.is_some() { "on" } else { "off" },
            ttl.as_secs()
        );

        Ok(Self {
            source,
            store,
            labels,
            settings,
            metrics,
            timelines: TtlCache::new(ttl),
            image_timelines: TtlCache::new(ttl),
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    pub fn store(&self) -> Option<&PrecomputedStore> {
        self.store.as_ref()
    }

    fn detector(&self) -> FixationDetector {
        FixationDetector::new(self.settings.fixation_config())
    }

    fn classifier(&self, patch_size: PatchSize) -> SemanticClassifier {
        SemanticClassifier::new(self.labels.clone(), self.settings.grid(patch_size))
    }

    fn precompute_params(&self) -> PrecomputeParams {
        PrecomputeParams {
            velocity_threshold: self.settings.velocity_threshold,
            min_duration: self.settings.min_fixation_duration,
            image_width: self.settings.image_width,
            image_height: self.settings.image_height,
        }
    }

    fn patch_size_or_default(&self, patch_size: Option<u32>) -> Result<PatchSize> {
        match patch_size {
            Some(pixels) => PatchSize::try_from(pixels),
            None => self.settings.default_patch_size(),
        }
    }

    async fn record(
        &self,
        query: &str,
        image_id: Option<i64>,
        participant_id: Option<i64>,
        source: QuerySource,
        started: Instant,
    ) {
        self.metrics
            .record_query(QueryRecord {
                timestamp: Utc::now(),
                query: query.to_string(),
                image_id,
                participant_id,
                source,
                elapsed_ms: started.elapsed().as_millis() as u64,
            })
            .await;
    }

    /// Labelled fixations for an image (or one participant on it): store first, live on miss.
    pub(crate) async fn resolve_fixations(
        &self,
        image_id: i64,
        participant_id: Option<i64>,
        patch_size: PatchSize,
    ) -> Result<(Vec<LabeledFixation>, FixationSource)> {
        if let Some(store) = &self.store {
            let params = self.precompute_params();
            if let Some(hit) = store.lookup(image_id, participant_id, patch_size, &params).await? {
                let covered = match participant_id {
                    Some(_) => true,
                    None => self
                        .source
                        .participants_for_image(image_id)
                        .iter()
                        .all(|participant| hit.participants.contains(participant)),
                };
                if covered {
                    log_debug!(
                        "fixation store hit for image {} participant {:?}",
                        image_id,
                        participant_id
                    );
                    return Ok((hit.fixations, FixationSource::Precomputed));
                }
                log_debug!("fixation store covers only part of image {}", image_id);
            }
        }

        let samples = self.source.samples(participant_id, Some(image_id));
        if samples.is_empty() {
            return Err(AttentionError::no_data(participant_id, Some(image_id)));
        }

        log_debug!(
            "live fixation detection for image {} participant {:?}",
            image_id,
            participant_id
        );
        let fixations = self.detector().detect(&samples);
        Ok((self.classifier(patch_size).label_fixations(&fixations), FixationSource::Live))
    }

    fn query_source(source: FixationSource) -> QuerySource {
        match source {
            FixationSource::Precomputed => QuerySource::Precomputed,
            FixationSource::Live => QuerySource::Live,
        }
    }

    /// Fixations labelled at `patch_size` (default from settings when `None`).
    pub async fn fixations(
        &self,
        image_id: i64,
        participant_id: Option<i64>,
        patch_size: Option<u32>,
    ) -> Result<Vec<LabeledFixation>> {
        let started = Instant::now();
        let patch_size = self.patch_size_or_default(patch_size)?;
        let (fixations, source) = self
            .resolve_fixations(image_id, participant_id, patch_size)
            .await?;
        self.record(
            "fixations",
            Some(image_id),
            participant_id,
            Self::query_source(source),
            started,
        )
        .await;
        Ok(fixations)
    }

    /// Fixations plus their summary statistics.
    pub async fn fixation_summary(
        &self,
        image_id: i64,
        participant_id: Option<i64>,
        patch_size: Option<u32>,
    ) -> Result<FixationSummary> {
        let started = Instant::now();
        let patch_size = self.patch_size_or_default(patch_size)?;
        let (fixations, source) = self
            .resolve_fixations(image_id, participant_id, patch_size)
            .await?;
        let stats = fixation_stats(fixations.iter().map(|labelled| &labelled.fixation));
        self.record(
            "fixation_summary",
            Some(image_id),
            participant_id,
            Self::query_source(source),
            started,
        )
        .await;

        Ok(FixationSummary {
            image_id,
            participant_id,
            patch_size: patch_size.pixels(),
            source,
            fixations,
            stats,
        })
    }

    /// Drop stored fixations for the key and every cached timeline of the image.
    pub async fn invalidate(
        &self,
        image_id: i64,
        participant_id: Option<i64>,
    ) -> Result<InvalidationReport> {
        let stored_fixations = match &self.store {
            Some(store) => store.invalidate(image_id, participant_id).await?,
            None => 0,
        };
        let cached_timelines = self.timelines.invalidate_where(|key| key.image_id == image_id)
            + self.image_timelines.invalidate_where(|key| key.image_id == image_id);

        Ok(InvalidationReport {
            stored_fixations,
            cached_timelines,
        })
    }

    /// Evict expired timeline entries; returns how many went.
    pub fn purge_expired(&self) -> usize {
        self.timelines.purge_expired() + self.image_timelines.purge_expired()
    }
}
