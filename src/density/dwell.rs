use std::collections::HashMap;

use crate::fixation::group_samples;
use crate::models::{GazeSample, GroupAxis, LabeledFixation};
use crate::semantic::sample_region;

/// Accumulated dwell time per (column, class).
///
/// Classes remember the order they were first seen; ranking ties fall back to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwellTable {
    classes: Vec<String>,
    times: HashMap<(i64, String), f64>,
    points: HashMap<i64, usize>,
}

impl DwellTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, column: i64, class: &str, time: f64) {
        if !self.classes.iter().any(|known| known == class) {
            self.classes.push(class.to_string());
        }
        *self.times.entry((column, class.to_string())).or_insert(0.0) += time;
        *self.points.entry(column).or_insert(0) += 1;
    }

    pub fn time(&self, column: i64, class: &str) -> f64 {
        self.times
            .get(&(column, class.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Classes in first-seen order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Samples or fixations that contributed.
    pub fn data_points(&self) -> usize {
        self.points.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Copy restricted to the given columns.
    pub fn restrict_to(&self, columns: &[i64]) -> DwellTable {
        let mut restricted = DwellTable::new();
        for class in &self.classes {
            for &column in columns {
                if let Some(time) = self.times.get(&(column, class.clone())) {
                    if !restricted.classes.contains(class) {
                        restricted.classes.push(class.clone());
                    }
                    restricted.times.insert((column, class.clone()), *time);
                }
            }
        }
        for &column in columns {
            if let Some(&count) = self.points.get(&column) {
                restricted.points.insert(column, count);
            }
        }
        restricted
    }
}

/// Dwell time from raw samples: each sample owns the gap until the next sample of its
/// (participant, image) block; the last sample of a block owns nothing.
pub fn dwell_from_samples(samples: &[GazeSample], axis: &GroupAxis) -> DwellTable {
    let mut table = DwellTable::new();

    for ((participant_id, image_id), block) in group_samples(samples) {
        let Some(column) = axis.column_of(participant_id, image_id) else {
            continue;
        };

        for (i, sample) in block.iter().enumerate() {
            let delta_t = block.get(i + 1).map(|next| next.t - sample.t).unwrap_or(0.0);
            table.add(column, &sample_region(sample), delta_t);
        }
    }

    table
}

/// Dwell time from fixations: the sum of fixation durations per region.
pub fn dwell_from_fixations(fixations: &[LabeledFixation], axis: &GroupAxis) -> DwellTable {
    let mut table = DwellTable::new();

    for labelled in fixations {
        let fixation = &labelled.fixation;
        if let Some(column) = axis.column_of(fixation.participant_id, fixation.image_id) {
            table.add(column, &labelled.region, fixation.duration);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_deltas_stop_at_block_boundaries() {
        let samples = vec![
            GazeSample::new(1, 0, 0.0, 0.0, 0.0).with_class("sky", None),
            GazeSample::new(1, 0, 0.5, 0.0, 0.0).with_class("road", None),
            GazeSample::new(1, 0, 2.0, 0.0, 0.0).with_class("sky", None),
            GazeSample::new(2, 0, 0.0, 0.0, 0.0).with_class("sky", None),
            GazeSample::new(2, 0, 1.0, 0.0, 0.0),
            // other image, outside the axis
            GazeSample::new(1, 5, 0.0, 0.0, 0.0).with_class("sky", None),
            GazeSample::new(1, 5, 3.0, 0.0, 0.0).with_class("sky", None),
        ];

        let table = dwell_from_samples(&samples, &GroupAxis::Participants { image_id: 0 });

        assert_eq!(table.time(1, "sky"), 0.5);
        assert_eq!(table.time(1, "road"), 1.5);
        assert_eq!(table.time(2, "sky"), 1.0);
        assert_eq!(table.time(2, "unknown"), 0.0);
        assert_eq!(table.classes(), ["sky", "road", "unknown"]);
        assert_eq!(table.data_points(), 5);
    }

    #[test]
    fn restriction_keeps_first_seen_order() {
        let mut table = DwellTable::new();
        table.add(1, "sky", 1.0);
        table.add(2, "road", 2.0);
        table.add(2, "sky", 3.0);

        let only_two = table.restrict_to(&[2]);

        assert_eq!(only_two.classes(), ["sky", "road"]);
        assert_eq!(only_two.time(2, "sky"), 3.0);
        assert_eq!(only_two.time(1, "sky"), 0.0);
        assert!(table.restrict_to(&[9]).is_empty());
    }
}
