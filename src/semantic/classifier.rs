use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{FixationEvent, GazeSample, LabeledFixation};
use crate::semantic::grid::{PatchGrid, PatchSize};

/// Region assigned to anything that has no label.
///
/// It is aggregated like any other region so unlabelled viewing time stays visible.
pub const UNKNOWN_REGION: &str = "unknown";

/// Per-image segmentation lookup keyed by grid cell.
pub trait LabelSource: Send + Sync {
    fn patch_label(
        &self,
        image_id: i64,
        patch_size: PatchSize,
        patch_index: usize,
    ) -> Option<String>;
}

/// Region of a raw sample, taken from its own class column.
pub fn sample_region(sample: &GazeSample) -> String {
    sample.label().unwrap_or(UNKNOWN_REGION).to_string()
}

/// Label counts for one patch, in first-seen order.
#[derive(Debug, Default)]
struct LabelTally {
    counts: Vec<(String, usize)>,
}

impl LabelTally {
    fn add(&mut self, label: &str) {
        match self.counts.iter_mut().find(|(seen, _)| seen == label) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((label.to_string(), 1)),
        }
    }

    /// Most frequent label; ties go to the one seen first.
    fn majority(self) -> Option<String> {
        let mut best: Option<(String, usize)> = None;
        for (label, count) in self.counts {
            match &best {
                Some((_, best_count)) if *best_count >= count => {}
                _ => best = Some((label, count)),
            }
        }
        best.map(|(label, _)| label)
    }
}

/// Majority label per patch, for every supported patch size and image.
#[derive(Debug, Clone, Default)]
pub struct PatchLabelMap {
    labels: HashMap<(i64, PatchSize), HashMap<usize, String>>,
}

impl PatchLabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from labelled samples; unlabelled samples and off-grid points are skipped.
    pub fn from_samples(samples: &[GazeSample], image_width: u32, image_height: u32) -> Self {
        let mut map = Self::new();

        for patch_size in PatchSize::ALL {
            let grid = PatchGrid::new(patch_size, image_width, image_height);
            let mut tallies: HashMap<(i64, usize), LabelTally> = HashMap::new();

            for sample in samples {
                let Some(label) = sample.label() else {
                    continue;
                };
                let Some(index) = grid.patch_index(sample.x, sample.y) else {
                    continue;
                };
                tallies.entry((sample.image_id, index)).or_default().add(label);
            }

            for ((image_id, index), tally) in tallies {
                if let Some(label) = tally.majority() {
                    map.insert(image_id, patch_size, index, label);
                }
            }
        }

        map
    }

    pub fn insert(
        &mut self,
        image_id: i64,
        patch_size: PatchSize,
        patch_index: usize,
        label: impl Into<String>,
    ) {
        self.labels
            .entry((image_id, patch_size))
            .or_default()
            .insert(patch_index, label.into());
    }

    /// Number of labelled patches across all images and sizes.
    pub fn len(&self) -> usize {
        self.labels.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LabelSource for PatchLabelMap {
    fn patch_label(
        &self,
        image_id: i64,
        patch_size: PatchSize,
        patch_index: usize,
    ) -> Option<String> {
        self.labels
            .get(&(image_id, patch_size))
            .and_then(|patches| patches.get(&patch_index))
            .cloned()
    }
}

/// Resolves pixel positions to semantic regions through a patch grid.
#[derive(Clone)]
pub struct SemanticClassifier {
    labels: Arc<dyn LabelSource>,
    grid: PatchGrid,
}

impl SemanticClassifier {
    pub fn new(labels: Arc<dyn LabelSource>, grid: PatchGrid) -> Self {
        Self { labels, grid }
    }

    pub fn grid(&self) -> &PatchGrid {
        &self.grid
    }

    pub fn classify(&self, x: f64, y: f64, image_id: i64) -> String {
        self.locate(x, y, image_id).1
    }

    pub fn classify_patch(&self, patch_index: usize, image_id: i64) -> String {
        if patch_index >= self.grid.total_patches() {
            return UNKNOWN_REGION.to_string();
        }
        self.labels
            .patch_label(image_id, self.grid.patch_size, patch_index)
            .unwrap_or_else(|| UNKNOWN_REGION.to_string())
    }

    /// Patch index and region of a pixel position.
    pub fn locate(&self, x: f64, y: f64, image_id: i64) -> (Option<usize>, String) {
        match self.grid.patch_index(x, y) {
            Some(index) => (Some(index), self.classify_patch(index, image_id)),
            None => (None, UNKNOWN_REGION.to_string()),
        }
    }

    /// Attach region and patch index to each fixation's centroid.
    pub fn label_fixations(&self, fixations: &[FixationEvent]) -> Vec<LabeledFixation> {
        fixations
            .iter()
            .map(|fixation| {
                let (patch_index, region) =
                    self.locate(fixation.x_centroid, fixation.y_centroid, fixation.image_id);
                LabeledFixation {
                    fixation: fixation.clone(),
                    region,
                    patch_index,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(image: i64, x: f64, y: f64, class: &str) -> GazeSample {
        GazeSample::new(1, image, 0.0, x, y).with_class(class, Some(0.5))
    }

    #[test]
    fn majority_label_wins_with_first_seen_ties() {
        let samples = vec![
            labelled(0, 5.0, 595.0, "road"),
            labelled(0, 6.0, 594.0, "sky"),
            labelled(0, 7.0, 593.0, "sky"),
            labelled(0, 50.0, 595.0, "car"),
            labelled(0, 51.0, 595.0, "tree"),
        ];

        let map = PatchLabelMap::from_samples(&samples, 800, 600);

        assert_eq!(map.patch_label(0, PatchSize::Px10, 0).as_deref(), Some("sky"));
        assert_eq!(map.patch_label(0, PatchSize::Px10, 5).as_deref(), Some("car"));
        // car and tree tie in patch 1; car was seen first
        assert_eq!(map.patch_label(0, PatchSize::Px40, 1).as_deref(), Some("car"));
        assert_eq!(map.patch_label(0, PatchSize::Px40, 0).as_deref(), Some("sky"));
        assert_eq!(map.patch_label(1, PatchSize::Px10, 0), None);
    }

    #[test]
    fn misses_resolve_to_unknown() {
        let mut map = PatchLabelMap::new();
        map.insert(0, PatchSize::Px40, 0, "sky");
        let classifier =
            SemanticClassifier::new(Arc::new(map), PatchGrid::new(PatchSize::Px40, 800, 600));

        assert_eq!(classifier.classify(10.0, 590.0, 0), "sky");
        assert_eq!(classifier.classify(10.0, 590.0, 1), UNKNOWN_REGION);
        assert_eq!(classifier.classify(-5.0, 590.0, 0), UNKNOWN_REGION);
        assert_eq!(classifier.classify_patch(10_000, 0), UNKNOWN_REGION);
    }

    #[test]
    fn fixations_carry_patch_index() {
        let mut map = PatchLabelMap::new();
        map.insert(2, PatchSize::Px20, 41, "person");
        let classifier =
            SemanticClassifier::new(Arc::new(map), PatchGrid::new(PatchSize::Px20, 800, 600));

        let fixation = FixationEvent {
            participant_id: 1,
            image_id: 2,
            start: 0.0,
            end: 0.5,
            duration: 0.5,
            x_centroid: 25.0,
            y_centroid: 575.0,
            point_count: 4,
        };

        let labelled = classifier.label_fixations(&[fixation]);
        assert_eq!(labelled[0].patch_index, Some(41));
        assert_eq!(labelled[0].region, "person");
    }

    #[test]
    fn raw_sample_without_class_is_unknown() {
        let sample = GazeSample::new(1, 0, 0.0, 1.0, 1.0);
        assert_eq!(sample_region(&sample), UNKNOWN_REGION);
    }
}
