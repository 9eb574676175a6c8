use gaze_attention::density::{aggregate, AreaRatios, DwellTable};
use gaze_attention::fixation::{detect_fixations, FixationConfig};
use gaze_attention::models::{DensityMode, FixationEvent, GazeSample, GroupAxis, LabeledFixation};
use gaze_attention::timeline::TimelineBuilder;

fn fixation(participant: i64, start: f64, end: f64, region: &str) -> LabeledFixation {
    LabeledFixation {
        fixation: FixationEvent {
            participant_id: participant,
            image_id: 0,
            start,
            end,
            duration: end - start,
            x_centroid: 100.0,
            y_centroid: 100.0,
            point_count: 4,
        },
        region: region.to_string(),
        patch_index: None,
    }
}

#[test]
fn steady_gaze_is_one_fixation() {
    // 0.2px per 0.25s = 0.8 px/s, below 1.15 px/s
    let samples: Vec<GazeSample> = (0..5)
        .map(|i| GazeSample::new(1, 0, i as f64 * 0.25, 300.0 + i as f64 * 0.2, 200.0))
        .collect();

    let fixations = detect_fixations(&samples, &FixationConfig::default());

    assert_eq!(fixations.len(), 1);
    assert!((fixations[0].duration - 1.0).abs() < 1e-9);
    assert_eq!(fixations[0].point_count, 5);
    assert!((fixations[0].x_centroid - 300.4).abs() < 1e-9);
}

#[test]
fn two_regions_give_one_transition() {
    let fixations = vec![fixation(1, 0.0, 1.0, "sky"), fixation(1, 1.1, 2.1, "road")];

    let result = TimelineBuilder::default().from_fixations(&fixations);

    assert_eq!(result.timeline.len(), 2);
    assert_eq!(result.sequence.len(), 1);
    assert_eq!(result.total_transitions, 1);
    let transition = &result.sequence[0];
    assert_eq!(transition.from_region, "sky");
    assert_eq!(transition.to_region, "road");
    assert!((transition.gap_duration - 0.1).abs() < 1e-9);
    assert!(!transition.is_overlapping());
    assert_eq!(result.unique_regions, 2);
}

#[test]
fn area_ratio_scales_attention_density() {
    let axis = GroupAxis::Participants { image_id: 0 };
    let mut table = DwellTable::new();
    table.add(1, "car", 10.0);

    let mut ratios = AreaRatios::new();
    ratios.insert(0, "car", 0.1);
    let scaled = aggregate(&table, &axis, &[1], &ratios, 15, DensityMode::Attention).unwrap();
    assert!((scaled.raw("car", 1).unwrap() - 100.0).abs() < 1e-9);

    let no_ratios = AreaRatios::new();
    let fallback = aggregate(&table, &axis, &[1], &no_ratios, 15, DensityMode::Attention).unwrap();
    assert_eq!(fallback.raw("car", 1), Some(10.0));
}

#[test]
fn top_n_larger_than_class_count() {
    let axis = GroupAxis::Images { participant_id: 4 };
    let mut table = DwellTable::new();
    table.add(10, "sky", 3.0);
    table.add(11, "road", 1.0);

    let matrix =
        aggregate(&table, &axis, &[10, 11], &AreaRatios::new(), 3, DensityMode::Time).unwrap();

    assert_eq!(matrix.classes.len(), 2);
    assert_eq!(matrix.matrix_raw.len(), 2);
    assert_eq!(matrix.matrix_normalized.len(), 2);
    assert_eq!(matrix.columns, vec![10, 11]);
}

#[test]
fn samples_without_classes_still_build_a_timeline() {
    let samples: Vec<GazeSample> = (0..6)
        .map(|i| GazeSample::new(2, 0, i as f64 * 0.1, 50.0, 50.0))
        .collect();

    let result = TimelineBuilder::default().from_samples(&samples);

    assert_eq!(result.timeline.len(), 1);
    assert_eq!(result.timeline[0].region, "unknown");
    assert!(result.sequence.is_empty());
}

#[test]
fn relative_timeline_starts_at_zero() {
    let fixations = vec![fixation(1, 10.0, 11.0, "sky"), fixation(1, 11.5, 12.5, "road")];
    let result = TimelineBuilder::default().from_fixations(&fixations);

    let relative = result.relative_to(result.time_range.start);

    assert_eq!(relative.timeline[0].start_time, 0.0);
    assert!((relative.sequence[0].time - 1.5).abs() < 1e-9);
    assert_eq!(relative.region_stats["road"].first_visit, 1.5);
    assert_eq!(relative.time_range.duration, result.time_range.duration);
    assert_eq!(relative.sequence[0].gap_duration, result.sequence[0].gap_duration);
}
