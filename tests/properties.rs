use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gaze_attention::density::{aggregate, dwell_from_samples, AreaRatios};
use gaze_attention::fixation::{detect_fixations, FixationConfig};
use gaze_attention::models::{DensityMode, GazeSample, GroupAxis};
use gaze_attention::timeline::{TimelineBuilder, TimelineConfig};

const CLASSES: [&str; 5] = ["sky", "road", "car", "tree", "person"];

/// Random walk with occasional saccades, for a few participants and images.
fn random_samples(
    rng: &mut StdRng,
    participants: i64,
    images: i64,
    per_block: usize,
) -> Vec<GazeSample> {
    let mut samples = Vec::new();
    for participant in 0..participants {
        for image in 0..images {
            let mut t = 0.0;
            let (mut x, mut y) = (rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0));
            for _ in 0..per_block {
                t += rng.gen_range(0.0..0.05);
                if rng.gen_bool(0.15) {
                    x = rng.gen_range(0.0..800.0);
                    y = rng.gen_range(0.0..600.0);
                } else {
                    x += rng.gen_range(-0.02..0.02);
                    y += rng.gen_range(-0.02..0.02);
                }
                let class = CLASSES[rng.gen_range(0..CLASSES.len())];
                let ratio = if rng.gen_bool(0.8) { Some(rng.gen_range(0.01..0.6)) } else { None };
                samples.push(GazeSample::new(participant, image, t, x, y).with_class(class, ratio));
            }
        }
    }
    samples
}

#[test]
fn fixations_stay_inside_their_block() {
    let mut rng = StdRng::seed_from_u64(7);
    let samples = random_samples(&mut rng, 3, 2, 200);
    let config = FixationConfig::default();

    let fixations = detect_fixations(&samples, &config);
    assert!(!fixations.is_empty());

    for fixation in &fixations {
        assert!(fixation.start <= fixation.end);
        assert!((fixation.duration - (fixation.end - fixation.start)).abs() < 1e-12);
        assert!(fixation.duration >= config.min_duration);
        assert!(fixation.point_count >= 1);

        let block: Vec<&GazeSample> = samples
            .iter()
            .filter(|s| s.block() == (fixation.participant_id, fixation.image_id))
            .collect();
        let first = block.iter().map(|s| s.t).fold(f64::INFINITY, f64::min);
        let last = block.iter().map(|s| s.t).fold(f64::NEG_INFINITY, f64::max);
        assert!(fixation.start >= first && fixation.end <= last);

        // Centroid lies in the bounding box of the samples it spans
        let members: Vec<&&GazeSample> = block
            .iter()
            .filter(|s| s.t >= fixation.start && s.t <= fixation.end)
            .collect();
        assert!(members.len() >= fixation.point_count);
        let min_x = members.iter().map(|s| s.x).fold(f64::INFINITY, f64::min);
        let max_x = members.iter().map(|s| s.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = members.iter().map(|s| s.y).fold(f64::INFINITY, f64::min);
        let max_y = members.iter().map(|s| s.y).fold(f64::NEG_INFINITY, f64::max);
        let eps = 1e-9;
        assert!(fixation.x_centroid >= min_x - eps && fixation.x_centroid <= max_x + eps);
        assert!(fixation.y_centroid >= min_y - eps && fixation.y_centroid <= max_y + eps);
    }

    // Fixations of one block never overlap
    for pair in fixations.windows(2) {
        let same_block = pair[0].participant_id == pair[1].participant_id
            && pair[0].image_id == pair[1].image_id;
        if same_block {
            assert!(pair[0].end < pair[1].start);
        }
    }
}

#[test]
fn detection_ignores_input_order() {
    let mut rng = StdRng::seed_from_u64(11);
    let samples = random_samples(&mut rng, 2, 2, 120);
    let config = FixationConfig::default();

    let mut reversed = samples.clone();
    reversed.reverse();

    assert_eq!(detect_fixations(&samples, &config), detect_fixations(&reversed, &config));
    assert_eq!(detect_fixations(&samples, &config), detect_fixations(&samples, &config));
}

#[test]
fn timeline_is_ordered_and_within_bounds() {
    let mut rng = StdRng::seed_from_u64(23);
    let samples = random_samples(&mut rng, 1, 1, 300);
    let config = TimelineConfig {
        min_stay_duration: 0.01,
        max_stay_duration: 5.0,
    };

    let result = TimelineBuilder::new(config).from_samples(&samples);
    assert!(!result.timeline.is_empty());

    for (i, stay) in result.timeline.iter().enumerate() {
        assert!(stay.start_time <= stay.end_time);
        if i > 0 {
            assert!(stay.duration >= config.min_stay_duration);
            assert!(stay.duration <= config.max_stay_duration);
        }
    }
    for pair in result.timeline.windows(2) {
        assert!(pair[0].start_time <= pair[1].start_time);
        assert!(pair[0].end_time <= pair[1].start_time);
    }

    // Each transition sits exactly between the stays it links
    let region_changes: Vec<_> = result
        .timeline
        .windows(2)
        .filter(|pair| pair[0].region != pair[1].region)
        .collect();
    assert_eq!(region_changes.len(), result.sequence.len());
    for (pair, transition) in region_changes.iter().zip(&result.sequence) {
        let (previous, next) = (&pair[0], &pair[1]);
        assert_eq!(transition.from_region, previous.region);
        assert_eq!(transition.to_region, next.region);
        assert_eq!(transition.time, next.start_time);
        assert_eq!(transition.gap_duration, next.start_time - previous.end_time);
        assert!(transition.gap_duration >= 0.0);
    }

    let changes = result
        .timeline
        .windows(2)
        .filter(|pair| pair[0].region != pair[1].region)
        .count();
    assert_eq!(result.sequence.len(), changes);
    assert_eq!(result.total_transitions, changes);

    let visits: usize = result.region_stats.values().map(|stats| stats.visit_count).sum();
    assert_eq!(visits, result.timeline.len());
}

#[test]
fn density_matrix_shape_and_normalization() {
    let mut rng = StdRng::seed_from_u64(42);
    let samples = random_samples(&mut rng, 6, 1, 80);
    let axis = GroupAxis::Participants { image_id: 0 };
    let table = dwell_from_samples(&samples, &axis);
    let ratios = AreaRatios::from_samples(&samples);
    let columns: Vec<i64> = (0..6).collect();

    for top_n in [1, 3, 15] {
        for mode in [DensityMode::Attention, DensityMode::Time] {
            let matrix = aggregate(&table, &axis, &columns, &ratios, top_n, mode).unwrap();

            assert_eq!(matrix.classes.len(), top_n.min(CLASSES.len()));
            assert_eq!(matrix.shape(), (matrix.classes.len(), columns.len()));
            assert!(matrix.matrix_raw.iter().all(|row| row.len() == columns.len()));

            let cells: Vec<f64> = matrix.matrix_raw.iter().flatten().copied().collect();
            let min = cells.iter().copied().fold(f64::INFINITY, f64::min);
            let max = cells.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(matrix.min_value, min);
            assert_eq!(matrix.max_value, max);

            if max > min {
                let normalized_cells = matrix.matrix_normalized.iter().flatten();
                for (raw, normalized) in cells.iter().zip(normalized_cells) {
                    assert!((0.0..=1.0).contains(normalized));
                    assert!((normalized - (raw - min) / (max - min)).abs() < 1e-9);
                }
            }
        }
    }
}
