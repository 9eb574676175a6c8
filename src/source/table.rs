use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::Result;
use crate::models::{validate_samples, GazeSample};
use crate::source::GazeSource;

/// Validated in-memory sample table indexed by (participant, image).
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    samples: Vec<GazeSample>,
    blocks: BTreeMap<(i64, i64), Range<usize>>,
}

impl SampleTable {
    /// Reject non-finite rows, then index by block. Row order inside a block is kept.
    pub fn new(samples: Vec<GazeSample>) -> Result<Self> {
        validate_samples(&samples)?;

        let mut samples = samples;
        samples.sort_by_key(|sample| sample.block());

        let mut blocks = BTreeMap::new();
        let mut start = 0;
        for i in 1..=samples.len() {
            if i == samples.len() || samples[i].block() != samples[start].block() {
                blocks.insert(samples[start].block(), start..i);
                start = i;
            }
        }

        Ok(Self { samples, blocks })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn block(&self, participant_id: i64, image_id: i64) -> &[GazeSample] {
        self.blocks
            .get(&(participant_id, image_id))
            .map(|range| &self.samples[range.clone()])
            .unwrap_or(&[])
    }

    pub fn images(&self) -> Vec<i64> {
        let mut images: Vec<i64> = self.blocks.keys().map(|(_, image)| *image).collect();
        images.sort_unstable();
        images.dedup();
        images
    }

    pub fn all(&self) -> &[GazeSample] {
        &self.samples
    }
}

impl GazeSource for SampleTable {
    fn samples(&self, participant_id: Option<i64>, image_id: Option<i64>) -> Vec<GazeSample> {
        self.blocks
            .iter()
            .filter(|((participant, image), _)| {
                participant_id.map_or(true, |p| p == *participant)
                    && image_id.map_or(true, |i| i == *image)
            })
            .flat_map(|(_, range)| self.samples[range.clone()].iter().cloned())
            .collect()
    }

    fn participants_for_image(&self, image_id: i64) -> Vec<i64> {
        self.blocks
            .keys()
            .filter(|(_, image)| *image == image_id)
            .map(|(participant, _)| *participant)
            .collect()
    }

    fn images_for_participant(&self, participant_id: i64) -> Vec<i64> {
        self.blocks
            .keys()
            .filter(|(participant, _)| *participant == participant_id)
            .map(|(_, image)| *image)
            .collect()
    }
}
