//! Indexed store of previously detected fixations.
//!
//! Each (image, participant) block is written whole together with the detection
//! parameters it was computed with. Lookups under other parameters miss, so the store
//! only ever changes latency, never results.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::db::models::{ImageStats, PrecomputeParams, StoredFixation};
use crate::db::{Database, FixationQuery};
use crate::error::Result;
use crate::fixation::{group_samples, FixationDetector};
use crate::models::{GazeSample, LabeledFixation};
use crate::semantic::{LabelSource, PatchGrid, PatchSize, SemanticClassifier};
use crate::source::GazeSource;
use crate::{log_debug, log_info};

const ENABLE_LOGS: bool = true;

/// Fixations served from the store and the participants they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub participants: Vec<i64>,
    pub fixations: Vec<LabeledFixation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulateReport {
    pub images: usize,
    pub blocks: usize,
    pub fixations: usize,
}

#[derive(Clone)]
pub struct PrecomputedStore {
    db: Database,
}

impl PrecomputedStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        Ok(Self {
            db: Database::new(path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::in_memory()?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Detect and store fixations for every block in the source.
    pub async fn populate_from_source(
        &self,
        source: &dyn GazeSource,
        detector: &FixationDetector,
        labels: Arc<dyn LabelSource>,
        image_width: u32,
        image_height: u32,
    ) -> Result<PopulateReport> {
        let samples = source.samples(None, None);
        self.populate(&samples, detector, labels, image_width, image_height)
            .await
    }

    /// Detect and store fixations for one image only.
    pub async fn populate_image(
        &self,
        source: &dyn GazeSource,
        image_id: i64,
        detector: &FixationDetector,
        labels: Arc<dyn LabelSource>,
        image_width: u32,
        image_height: u32,
    ) -> Result<PopulateReport> {
        let samples = source.samples(None, Some(image_id));
        self.populate(&samples, detector, labels, image_width, image_height)
            .await
    }

    async fn populate(
        &self,
        samples: &[GazeSample],
        detector: &FixationDetector,
        labels: Arc<dyn LabelSource>,
        image_width: u32,
        image_height: u32,
    ) -> Result<PopulateReport> {
        let params = PrecomputeParams {
            velocity_threshold: detector.config().velocity_threshold,
            min_duration: detector.config().min_duration,
            image_width,
            image_height,
        };
        let classifiers = PatchSize::ALL.map(|size| {
            SemanticClassifier::new(labels.clone(), PatchGrid::new(size, image_width, image_height))
        });

        // Every source block gets an entry, even if it yields no fixations
        let mut blocks: BTreeMap<(i64, i64), Vec<StoredFixation>> = group_samples(samples)
            .keys()
            .map(|&(participant_id, image_id)| ((image_id, participant_id), Vec::new()))
            .collect();

        for fixation in detector.detect(samples) {
            let key = (fixation.image_id, fixation.participant_id);
            let stored = StoredFixation::resolve(fixation, &classifiers);
            blocks.entry(key).or_default().push(stored);
        }

        let block_count = blocks.len();
        let mut images: Vec<i64> = blocks.keys().map(|(image_id, _)| *image_id).collect();
        images.dedup();

        let fixations = self
            .db
            .replace_blocks(params, blocks.into_iter().collect())
            .await?;

        log_info!(
            "precomputed {} fixations across {} blocks on {} images",
            fixations,
            block_count,
            images.len()
        );

        Ok(PopulateReport {
            images: images.len(),
            blocks: block_count,
            fixations,
        })
    }

    /// Stored fixations for the key, or `None` when nothing matching `params` exists.
    ///
    /// Image-wide lookups report which participants were found; callers decide
    /// whether that coverage is complete.
    pub async fn lookup(
        &self,
        image_id: i64,
        participant_id: Option<i64>,
        patch_size: PatchSize,
        params: &PrecomputeParams,
    ) -> Result<Option<StoreHit>> {
        let blocks = self.db.get_blocks(image_id, participant_id).await?;
        let matching: Vec<i64> = blocks
            .iter()
            .filter(|block| block.params == *params)
            .map(|block| block.participant_id)
            .collect();

        if matching.is_empty() || matching.len() != blocks.len() {
            log_debug!(
                "fixation store miss for image {} participant {:?} ({} of {} blocks match)",
                image_id,
                participant_id,
                matching.len(),
                blocks.len()
            );
            return Ok(None);
        }

        let fixations = self
            .db
            .get_fixations(FixationQuery {
                image_id,
                participant_id,
                patch_size,
            })
            .await?;

        Ok(Some(StoreHit {
            participants: matching,
            fixations,
        }))
    }

    pub async fn image_stats(&self, image_id: i64) -> Result<Option<ImageStats>> {
        Ok(self.db.get_image_stats(image_id).await?)
    }

    pub async fn precomputed_images(&self) -> Result<Vec<i64>> {
        Ok(self.db.get_precomputed_images().await?)
    }

    /// Drop stored blocks for an image, or one participant on it.
    pub async fn invalidate(&self, image_id: i64, participant_id: Option<i64>) -> Result<usize> {
        let deleted = self.db.delete_blocks(image_id, participant_id).await?;
        log_info!(
            "invalidated {} stored fixations for image {} participant {:?}",
            deleted,
            image_id,
            participant_id
        );
        Ok(deleted)
    }
}
