use serde::{Deserialize, Serialize};

use crate::models::{FixationEvent, LabeledFixation};
use crate::semantic::{PatchSize, SemanticClassifier};

/// Fixation row with its patch index and region at every supported patch size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFixation {
    pub fixation: FixationEvent,
    pub patch_10: Option<usize>,
    pub patch_20: Option<usize>,
    pub patch_40: Option<usize>,
    pub region_10: String,
    pub region_20: String,
    pub region_40: String,
}

impl StoredFixation {
    /// Resolve a fixation through one classifier per supported patch size.
    ///
    /// `classifiers` must be ordered like `PatchSize::ALL`.
    pub fn resolve(fixation: FixationEvent, classifiers: &[SemanticClassifier; 3]) -> Self {
        let [(patch_10, region_10), (patch_20, region_20), (patch_40, region_40)] = classifiers
            .each_ref()
            .map(|classifier| {
                classifier.locate(fixation.x_centroid, fixation.y_centroid, fixation.image_id)
            });

        Self {
            fixation,
            patch_10,
            patch_20,
            patch_40,
            region_10,
            region_20,
            region_40,
        }
    }

    pub fn patch(&self, patch_size: PatchSize) -> Option<usize> {
        match patch_size {
            PatchSize::Px10 => self.patch_10,
            PatchSize::Px20 => self.patch_20,
            PatchSize::Px40 => self.patch_40,
        }
    }

    pub fn region(&self, patch_size: PatchSize) -> &str {
        match patch_size {
            PatchSize::Px10 => &self.region_10,
            PatchSize::Px20 => &self.region_20,
            PatchSize::Px40 => &self.region_40,
        }
    }

    pub fn labeled(&self, patch_size: PatchSize) -> LabeledFixation {
        LabeledFixation {
            fixation: self.fixation.clone(),
            region: self.region(patch_size).to_string(),
            patch_index: self.patch(patch_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::semantic::{PatchGrid, PatchLabelMap, UNKNOWN_REGION};

    #[test]
    fn resolves_every_patch_size() {
        let mut labels = PatchLabelMap::new();
        let grid_40 = PatchGrid::new(PatchSize::Px40, 800, 600);
        let index_40 = grid_40.patch_index(105.0, 500.0).unwrap();
        labels.insert(0, PatchSize::Px40, index_40, "sky");
        let labels = Arc::new(labels);

        let classifiers = PatchSize::ALL
            .map(|size| SemanticClassifier::new(labels.clone(), PatchGrid::new(size, 800, 600)));
        let fixation = FixationEvent {
            participant_id: 1,
            image_id: 0,
            start: 0.0,
            end: 1.0,
            duration: 1.0,
            x_centroid: 105.0,
            y_centroid: 500.0,
            point_count: 5,
        };

        let stored = StoredFixation::resolve(fixation, &classifiers);

        assert_eq!(stored.patch(PatchSize::Px40), Some(index_40));
        assert!(stored.patch(PatchSize::Px10).is_some());
        assert_eq!(stored.region(PatchSize::Px40), "sky");
        assert_eq!(stored.region(PatchSize::Px10), UNKNOWN_REGION);

        let labeled = stored.labeled(PatchSize::Px40);
        assert_eq!(labeled.region, "sky");
        assert_eq!(labeled.patch_index, Some(index_40));
    }
}
