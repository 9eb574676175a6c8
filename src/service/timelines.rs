use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;

use crate::cache::{ImageTimelinesKey, TimelineKey};
use crate::error::{AttentionError, Outcome, Result};
use crate::metrics::QuerySource;
use crate::models::{DataKind, FixationSource, ImageTimelines, ParticipantTimeline};
use crate::semantic::PatchSize;
use crate::service::AttentionService;
use crate::timeline::TimelineBuilder;
use crate::{log_debug, log_warn};

const ENABLE_LOGS: bool = true;

impl AttentionService {
    /// One participant's timeline on one image, served from the TTL cache when fresh.
    pub async fn timeline(
        &self,
        image_id: i64,
        participant_id: i64,
        patch_size: Option<u32>,
        kind: DataKind,
    ) -> Result<ParticipantTimeline> {
        let started = Instant::now();
        let key = TimelineKey {
            image_id,
            participant_id,
            patch_size: self.patch_size_or_default(patch_size)?,
            kind,
        };

        let (timeline, cached) = self.participant_timeline(key).await?;
        let source = if cached {
            self.metrics.record_cache_hit().await;
            QuerySource::TtlCache
        } else {
            self.metrics.record_cache_miss().await;
            Self::timeline_source(kind, timeline.source)
        };
        self.record("timeline", Some(image_id), Some(participant_id), source, started)
            .await;

        Ok(timeline)
    }

    /// Cached or freshly built timeline; the flag is true on a cache hit.
    ///
    /// Records no query metrics, so a batch counts as a single query.
    async fn participant_timeline(&self, key: TimelineKey) -> Result<(ParticipantTimeline, bool)> {
        if let Some(cached) = self.timelines.get(&key) {
            log_debug!("timeline cache hit for {:?}", key);
            return Ok((cached.as_ref().clone(), true));
        }

        let timeline = self.build_participant_timeline(&key).await?;
        Ok((self.timelines.insert(key, timeline).as_ref().clone(), false))
    }

    fn timeline_source(kind: DataKind, source: FixationSource) -> QuerySource {
        match kind {
            DataKind::Gaze => QuerySource::Gaze,
            DataKind::Fixations => Self::query_source(source),
        }
    }

    async fn build_participant_timeline(&self, key: &TimelineKey) -> Result<ParticipantTimeline> {
        let builder = TimelineBuilder::new(self.settings.timeline_config());

        let (result, source) = match key.kind {
            DataKind::Fixations => {
                let (fixations, source) = self
                    .resolve_fixations(key.image_id, Some(key.participant_id), key.patch_size)
                    .await?;
                (builder.from_fixations(&fixations), source)
            }
            DataKind::Gaze => {
                let samples = self.source.samples(Some(key.participant_id), Some(key.image_id));
                if samples.is_empty() {
                    return Err(AttentionError::no_data(
                        Some(key.participant_id),
                        Some(key.image_id),
                    ));
                }
                (builder.from_samples(&samples), FixationSource::Live)
            }
        };

        if result.dropped_anomalous > 0 || result.overlapping_transitions > 0 {
            log_warn!(
                "timeline for image {} participant {}: {} anomalous stays dropped, {} overlapping transitions",
                key.image_id,
                key.participant_id,
                result.dropped_anomalous,
                result.overlapping_transitions
            );
        }
        self.metrics.record_dropped_stays(result.dropped_anomalous).await;

        Ok(ParticipantTimeline {
            participant_id: key.participant_id,
            source,
            result,
        })
    }

    /// Timelines of every participant on an image, or of the first `limit` by id.
    ///
    /// Participants without data get an error entry instead of failing the batch.
    pub async fn image_timelines(
        &self,
        image_id: i64,
        patch_size: Option<u32>,
        limit: Option<usize>,
        kind: DataKind,
    ) -> Result<ImageTimelines> {
        let started = Instant::now();
        let patch_size = self.patch_size_or_default(patch_size)?;
        let key = ImageTimelinesKey {
            image_id,
            patch_size,
            limit: limit.map(|n| n.max(1)),
            kind,
        };

        let (timelines, source) = match self.image_timelines.get(&key) {
            Some(cached) => {
                log_debug!("image timelines cache hit for {:?}", key);
                self.metrics.record_cache_hit().await;
                (cached.as_ref().clone(), QuerySource::TtlCache)
            }
            None => {
                self.metrics.record_cache_miss().await;
                let built = self.build_image_timelines(&key, patch_size).await?;
                let source = Self::batch_source(&built);
                (self.image_timelines.insert(key, built).as_ref().clone(), source)
            }
        };
        self.record("image_timelines", Some(image_id), None, source, started)
            .await;

        Ok(timelines)
    }

    // Any live participant makes the whole batch a live fallback.
    fn batch_source(timelines: &ImageTimelines) -> QuerySource {
        let any_live = timelines
            .participants_data
            .values()
            .filter_map(|outcome| outcome.ok())
            .any(|timeline| timeline.source == FixationSource::Live);

        match timelines.kind {
            DataKind::Gaze => QuerySource::Gaze,
            DataKind::Fixations if any_live => QuerySource::Live,
            DataKind::Fixations => QuerySource::Precomputed,
        }
    }

    async fn build_image_timelines(
        &self,
        key: &ImageTimelinesKey,
        patch_size: PatchSize,
    ) -> Result<ImageTimelines> {
        let mut participants = self.source.participants_for_image(key.image_id);
        if let Some(limit) = key.limit {
            participants.truncate(limit);
        }
        if participants.is_empty() {
            return Err(AttentionError::no_data(None, Some(key.image_id)));
        }

        let mut participants_data = BTreeMap::new();
        let mut total_segments = 0;

        for &participant_id in &participants {
            let participant_key = TimelineKey {
                image_id: key.image_id,
                participant_id,
                patch_size,
                kind: key.kind,
            };
            let outcome: Outcome<ParticipantTimeline> = self
                .participant_timeline(participant_key)
                .await
                .map(|(timeline, _)| timeline)
                .into();
            if let Some(timeline) = outcome.ok() {
                total_segments += timeline.result.timeline.len();
            }
            participants_data.insert(participant_id, outcome);
        }

        Ok(ImageTimelines {
            image_id: key.image_id,
            patch_size: patch_size.pixels(),
            kind: key.kind,
            participants,
            participants_data,
            total_segments,
            generated_at: Utc::now(),
        })
    }
}
