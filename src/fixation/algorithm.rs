use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fixation::config::FixationConfig;
use crate::models::{FixationEvent, GazeSample, TimedPoint};

/// Velocity-threshold fixation detector.
#[derive(Debug, Clone, Default)]
pub struct FixationDetector {
    config: FixationConfig,
}

impl FixationDetector {
    pub fn new(config: FixationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FixationConfig {
        &self.config
    }

    pub fn detect(&self, samples: &[GazeSample]) -> Vec<FixationEvent> {
        detect_fixations(samples, &self.config)
    }
}

/// A velocity-labelled sample inside one (participant, image) block.
struct LabelledSample<'a> {
    sample: &'a GazeSample,
    is_fixation: bool,
}

/// Main detection function: transforms raw samples into fixation events.
///
/// Input may span several (participant, image) blocks and need not be sorted; output
/// is ordered by participant, image, then start time.
pub fn detect_fixations(samples: &[GazeSample], config: &FixationConfig) -> Vec<FixationEvent> {
    let mut fixations = Vec::new();

    for ((participant_id, image_id), block) in group_samples(samples) {
        // Edge case: a lone sample cannot form a duration
        if block.len() < 2 {
            continue;
        }

        let labelled = label_velocities(&block, config.velocity_threshold);

        for cluster in run_length_clusters(&labelled) {
            if !cluster[0].is_fixation {
                continue;
            }

            let first = cluster[0].sample;
            let last = cluster[cluster.len() - 1].sample;
            let duration = last.t - first.t;
            if duration < config.min_duration {
                continue;
            }

            let count = cluster.len() as f64;
            let x_centroid = cluster.iter().map(|s| s.sample.x).sum::<f64>() / count;
            let y_centroid = cluster.iter().map(|s| s.sample.y).sum::<f64>() / count;

            fixations.push(FixationEvent {
                participant_id,
                image_id,
                start: first.t,
                end: last.t,
                duration,
                x_centroid,
                y_centroid,
                point_count: cluster.len(),
            });
        }
    }

    fixations
}

/// Group samples by (participant, image), each block sorted by time.
///
/// The sort is stable, so duplicate timestamps keep their input order.
pub fn group_samples(samples: &[GazeSample]) -> BTreeMap<(i64, i64), Vec<&GazeSample>> {
    let mut blocks: BTreeMap<(i64, i64), Vec<&GazeSample>> = BTreeMap::new();
    for sample in samples {
        blocks.entry(sample.block()).or_default().push(sample);
    }
    for block in blocks.values_mut() {
        block.sort_by(|a, b| a.t.total_cmp(&b.t));
    }
    blocks
}

/// Label each sample with `velocity < threshold` using backward differences.
///
/// The first sample has zero deltas; a zero time step counts as zero velocity so that
/// duplicated timestamps never split a fixation.
fn label_velocities<'a>(block: &[&'a GazeSample], threshold: f64) -> Vec<LabelledSample<'a>> {
    let mut labelled = Vec::with_capacity(block.len());
    let mut previous: Option<&GazeSample> = None;

    for &sample in block {
        let velocity = match previous {
            Some(prev) => {
                let dt = sample.t - prev.t;
                let dx = sample.x - prev.x;
                let dy = sample.y - prev.y;
                if dt == 0.0 {
                    0.0
                } else {
                    (dx * dx + dy * dy).sqrt() / dt
                }
            }
            None => 0.0,
        };

        labelled.push(LabelledSample {
            sample,
            is_fixation: velocity < threshold,
        });
        previous = Some(sample);
    }

    labelled
}

/// Split into maximal runs of identical `is_fixation` labels.
fn run_length_clusters<'s, 'a>(
    labelled: &'s [LabelledSample<'a>],
) -> Vec<&'s [LabelledSample<'a>]> {
    let mut clusters = Vec::new();
    let mut run_start = 0;

    for i in 1..=labelled.len() {
        let run_ends =
            i == labelled.len() || labelled[i].is_fixation != labelled[run_start].is_fixation;
        if run_ends {
            clusters.push(&labelled[run_start..i]);
            run_start = i;
        }
    }

    clusters
}

/// Half-open pixel rectangle `[x_min, x_max) x [y_min, y_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PixelBounds {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_min <= x && x < self.x_max && self.y_min <= y && y < self.y_max
    }
}

/// Keep fixations whose centroid lies inside `bounds`.
///
/// Detect over the whole image first; filtering samples before detection would
/// distort the velocities at the region border.
pub fn fixations_in_bounds<T: TimedPoint + Clone>(fixations: &[T], bounds: &PixelBounds) -> Vec<T> {
    fixations
        .iter()
        .filter(|f| {
            let (x, y) = f.position();
            bounds.contains(x, y)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(participant: i64, image: i64, t: f64, x: f64, y: f64) -> GazeSample {
        GazeSample::new(participant, image, t, x, y)
    }

    #[test]
    fn slow_drift_forms_single_fixation() {
        let samples: Vec<GazeSample> = (0..5)
            .map(|i| sample(1, 0, i as f64 * 0.25, 100.0 + i as f64 * 0.2, 200.0))
            .collect();

        let fixations = detect_fixations(&samples, &FixationConfig::default());

        assert_eq!(fixations.len(), 1);
        let fix = &fixations[0];
        assert_eq!(fix.point_count, 5);
        assert!((fix.duration - 1.0).abs() < 1e-9);
        assert!((fix.x_centroid - 100.4).abs() < 1e-9);
        assert_eq!(fix.y_centroid, 200.0);
    }

    #[test]
    fn saccade_splits_fixations() {
        let samples = vec![
            sample(1, 0, 0.0, 10.0, 10.0),
            sample(1, 0, 1.0, 10.5, 10.0),
            sample(1, 0, 2.0, 300.0, 300.0),
            sample(1, 0, 3.0, 300.5, 300.0),
            sample(1, 0, 4.0, 300.5, 300.5),
        ];

        let fixations = detect_fixations(&samples, &FixationConfig::default());

        assert_eq!(fixations.len(), 2);
        assert_eq!(fixations[0].point_count, 2);
        assert_eq!(fixations[0].end, 1.0);
        assert_eq!(fixations[1].start, 3.0);
        assert_eq!(fixations[1].point_count, 2);
    }

    #[test]
    fn duplicate_timestamps_do_not_break_fixation() {
        let samples = vec![
            sample(1, 0, 0.0, 10.0, 10.0),
            sample(1, 0, 0.5, 10.2, 10.0),
            sample(1, 0, 0.5, 40.0, 10.0),
            sample(1, 0, 1.0, 40.2, 10.0),
        ];

        let fixations = detect_fixations(&samples, &FixationConfig::default());

        assert_eq!(fixations.len(), 1);
        assert_eq!(fixations[0].point_count, 4);
    }

    #[test]
    fn single_sample_block_yields_nothing() {
        let samples = vec![sample(1, 0, 0.0, 10.0, 10.0)];
        let config = FixationConfig {
            velocity_threshold: 1.15,
            min_duration: 0.0,
        };
        assert!(detect_fixations(&samples, &config).is_empty());
        assert!(detect_fixations(&[], &config).is_empty());
    }

    #[test]
    fn single_point_cluster_respects_min_duration() {
        // fast, slow(1 point), fast
        let samples = vec![
            sample(1, 0, 0.0, 0.0, 0.0),
            sample(1, 0, 0.1, 100.0, 0.0),
            sample(1, 0, 0.2, 100.0, 0.0),
            sample(1, 0, 0.3, 200.0, 0.0),
        ];

        let lenient = FixationConfig {
            velocity_threshold: 1.15,
            min_duration: 0.0,
        };
        let fixations = detect_fixations(&samples, &lenient);
        // leading sample (velocity 0) and the resting sample at t=0.2
        assert_eq!(fixations.len(), 2);
        assert!(fixations.iter().all(|f| f.duration == 0.0 && f.point_count == 1));

        let strict = FixationConfig {
            velocity_threshold: 1.15,
            min_duration: 0.05,
        };
        assert!(detect_fixations(&samples, &strict).is_empty());
    }

    #[test]
    fn unsorted_multi_block_input_is_grouped_and_sorted() {
        let samples = vec![
            sample(2, 0, 1.0, 50.0, 50.0),
            sample(1, 0, 1.0, 10.0, 10.0),
            sample(2, 0, 0.0, 50.0, 50.0),
            sample(1, 0, 0.0, 10.0, 10.0),
        ];

        let fixations = detect_fixations(&samples, &FixationConfig::default());

        assert_eq!(fixations.len(), 2);
        assert_eq!(fixations[0].participant_id, 1);
        assert_eq!(fixations[1].participant_id, 2);
        assert!(fixations.iter().all(|f| f.start == 0.0 && f.end == 1.0));
    }

    #[test]
    fn bounds_filter_is_half_open() {
        let fixations = vec![
            FixationEvent {
                participant_id: 1,
                image_id: 0,
                start: 0.0,
                end: 1.0,
                duration: 1.0,
                x_centroid: 10.0,
                y_centroid: 10.0,
                point_count: 3,
            },
            FixationEvent {
                participant_id: 1,
                image_id: 0,
                start: 1.0,
                end: 2.0,
                duration: 1.0,
                x_centroid: 400.0,
                y_centroid: 10.0,
                point_count: 3,
            },
        ];
        let bounds = PixelBounds {
            x_min: 0.0,
            x_max: 400.0,
            y_min: 0.0,
            y_max: 300.0,
        };

        let inside = fixations_in_bounds(&fixations, &bounds);
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].x_centroid, 10.0);
    }
}
