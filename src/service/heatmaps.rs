use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::density::{
    dwell_from_fixations, dwell_from_samples, patch_attention_matrix, AreaRatios, DensityAggregator,
    DwellTable,
};
use crate::error::{AttentionError, Result};
use crate::metrics::QuerySource;
use crate::models::{
    DataKind, DensityMatrix, DensityMode, FixationSource, GazeSample, GroupAxis, PatchAttention,
};
use crate::service::AttentionService;

/// Per-request overrides; unset fields come from the service settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapOptions {
    pub kind: DataKind,
    pub patch_size: Option<u32>,
    pub top_n: Option<usize>,
    pub mode: Option<DensityMode>,
}

impl AttentionService {
    /// Class x participant density for one image.
    ///
    /// An empty `participants` list means every participant with data on the image.
    pub async fn class_heatmap(
        &self,
        image_id: i64,
        participants: &[i64],
        options: &HeatmapOptions,
    ) -> Result<DensityMatrix> {
        let started = Instant::now();
        let axis = GroupAxis::Participants { image_id };
        let columns = if participants.is_empty() {
            self.source.participants_for_image(image_id)
        } else {
            participants.to_vec()
        };

        let samples = self.source.samples(None, Some(image_id));
        let ratios = AreaRatios::from_samples(&samples);

        let (table, source) = match options.kind {
            DataKind::Gaze => (dwell_from_samples(&samples, &axis), QuerySource::Gaze),
            DataKind::Fixations => {
                let patch_size = self.patch_size_or_default(options.patch_size)?;
                let (fixations, source) = self.resolve_fixations(image_id, None, patch_size).await?;
                (dwell_from_fixations(&fixations, &axis), Self::query_source(source))
            }
        };

        let matrix = self.aggregate_with(&table, &axis, &columns, &ratios, options)?;
        self.record("class_heatmap", Some(image_id), None, source, started)
            .await;
        Ok(matrix)
    }

    /// Class x image density for one participant.
    ///
    /// An empty `images` list means every image the participant has data on.
    pub async fn participant_heatmap(
        &self,
        participant_id: i64,
        images: &[i64],
        options: &HeatmapOptions,
    ) -> Result<DensityMatrix> {
        let started = Instant::now();
        let axis = GroupAxis::Images { participant_id };
        let columns = if images.is_empty() {
            self.source.images_for_participant(participant_id)
        } else {
            images.to_vec()
        };

        let samples = self.source.samples(Some(participant_id), None);
        let ratios = AreaRatios::from_samples(&self.ratio_samples(&columns));

        let mut any_live = false;
        let table = match options.kind {
            DataKind::Gaze => dwell_from_samples(&samples, &axis),
            DataKind::Fixations => {
                let patch_size = self.patch_size_or_default(options.patch_size)?;
                let mut fixations = Vec::new();
                for &image_id in &columns {
                    match self.resolve_fixations(image_id, Some(participant_id), patch_size).await {
                        Ok((found, source)) => {
                            any_live |= source == FixationSource::Live;
                            fixations.extend(found);
                        }
                        // Zero-filled column
                        Err(AttentionError::NoData { .. }) => {}
                        Err(err) => return Err(err),
                    }
                }
                dwell_from_fixations(&fixations, &axis)
            }
        };

        let matrix = self.aggregate_with(&table, &axis, &columns, &ratios, options)?;
        let source = match options.kind {
            DataKind::Gaze => QuerySource::Gaze,
            DataKind::Fixations if any_live => QuerySource::Live,
            DataKind::Fixations => QuerySource::Precomputed,
        };
        self.record("participant_heatmap", None, Some(participant_id), source, started)
            .await;
        Ok(matrix)
    }

    /// Fixation counts per participant and patch for one image.
    pub async fn patch_attention(
        &self,
        image_id: i64,
        patch_size: Option<u32>,
    ) -> Result<PatchAttention> {
        let started = Instant::now();
        let patch_size = self.patch_size_or_default(patch_size)?;
        let (fixations, source) = self.resolve_fixations(image_id, None, patch_size).await?;

        let grid = self.settings.grid(patch_size);
        let attention = patch_attention_matrix(&fixations, image_id, &grid);
        self.record("patch_attention", Some(image_id), None, Self::query_source(source), started)
            .await;
        Ok(attention)
    }

    // Area ratios describe the image, so they come from every participant's samples.
    fn ratio_samples(&self, images: &[i64]) -> Vec<GazeSample> {
        images
            .iter()
            .flat_map(|&image_id| self.source.samples(None, Some(image_id)))
            .collect()
    }

    fn aggregate_with(
        &self,
        table: &DwellTable,
        axis: &GroupAxis,
        columns: &[i64],
        ratios: &AreaRatios,
        options: &HeatmapOptions,
    ) -> Result<DensityMatrix> {
        DensityAggregator::new(
            options.top_n.unwrap_or(self.settings.top_n_classes),
            options.mode.unwrap_or(self.settings.density_mode),
        )
        .aggregate(table, axis, columns, ratios)
    }
}
