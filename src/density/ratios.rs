use std::collections::HashMap;

use crate::models::GazeSample;
use crate::semantic::sample_region;

/// Share of the image area each class occupies, per (image, class).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaRatios {
    ratios: HashMap<(i64, String), f64>,
}

impl AreaRatios {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of the finite `class_area_ratio` values seen for each (image, class).
    pub fn from_samples(samples: &[GazeSample]) -> Self {
        let mut sums: HashMap<(i64, String), (f64, usize)> = HashMap::new();

        for sample in samples {
            let Some(ratio) = sample.class_area_ratio.filter(|r| r.is_finite()) else {
                continue;
            };
            let entry = sums
                .entry((sample.image_id, sample_region(sample)))
                .or_insert((0.0, 0));
            entry.0 += ratio;
            entry.1 += 1;
        }

        let ratios = sums
            .into_iter()
            .map(|(key, (sum, count))| (key, sum / count as f64))
            .collect();

        Self { ratios }
    }

    pub fn insert(&mut self, image_id: i64, class: impl Into<String>, ratio: f64) {
        self.ratios.insert((image_id, class.into()), ratio);
    }

    pub fn get(&self, image_id: i64, class: &str) -> Option<f64> {
        self.ratios.get(&(image_id, class.to_string())).copied()
    }
}
