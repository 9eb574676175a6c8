use std::collections::BTreeMap;

use crate::models::{FixationEvent, FixationStats};

/// Summary statistics over a set of fixations; all zeros when empty.
pub fn fixation_stats<'a, I>(fixations: I) -> FixationStats
where
    I: IntoIterator<Item = &'a FixationEvent>,
{
    let mut durations = Vec::new();
    let mut per_participant: BTreeMap<i64, usize> = BTreeMap::new();

    for fixation in fixations {
        durations.push(fixation.duration);
        *per_participant.entry(fixation.participant_id).or_insert(0) += 1;
    }

    if durations.is_empty() {
        return FixationStats::default();
    }

    durations.sort_by(|a, b| a.total_cmp(b));
    let count = durations.len() as f64;
    let mean = durations.iter().sum::<f64>() / count;
    let variance = durations.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / count;

    FixationStats {
        total_fixations: durations.len(),
        participants: per_participant.len(),
        avg_duration: mean,
        median_duration: median_of_sorted(&durations),
        min_duration: durations[0],
        max_duration: durations[durations.len() - 1],
        duration_std: variance.sqrt(),
        fixations_per_participant: per_participant,
    }
}

pub(crate) fn median_of_sorted(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        n if n % 2 == 1 => values[n / 2],
        n => (values[n / 2 - 1] + values[n / 2]) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixation(participant: i64, duration: f64) -> FixationEvent {
        FixationEvent {
            participant_id: participant,
            image_id: 3,
            start: 0.0,
            end: duration,
            duration,
            x_centroid: 0.0,
            y_centroid: 0.0,
            point_count: 2,
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = fixation_stats(&Vec::<FixationEvent>::new());
        assert_eq!(stats.total_fixations, 0);
        assert_eq!(stats.avg_duration, 0.0);
        assert!(stats.fixations_per_participant.is_empty());
    }

    #[test]
    fn computes_population_statistics() {
        let fixations =
            vec![fixation(1, 1.0), fixation(1, 3.0), fixation(2, 2.0), fixation(2, 4.0)];

        let stats = fixation_stats(&fixations);

        assert_eq!(stats.total_fixations, 4);
        assert_eq!(stats.participants, 2);
        assert_eq!(stats.avg_duration, 2.5);
        assert_eq!(stats.median_duration, 2.5);
        assert_eq!(stats.min_duration, 1.0);
        assert_eq!(stats.max_duration, 4.0);
        assert!((stats.duration_std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.fixations_per_participant.get(&1), Some(&2));
    }
}
