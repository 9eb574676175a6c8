//! Serialization boundary for results handed to callers.
//!
//! JSON has no NaN or infinity. Every output record implements [`Sanitize`], and
//! [`to_json_value`] scrubs a copy before serializing it, so domain code never has to.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::db::models::ImageStats;
use crate::error::Outcome;
use crate::models::{
    DensityMatrix, FixationEvent, FixationStats, FixationSummary, ImageTimelines, LabeledFixation,
    PatchAttention, ParticipantTimeline, RegionStats, RegionStay, TimeRange, TimelineResult,
    Transition,
};

/// Replace non-finite floats with `0.0`, in place.
pub trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for f64 {
    fn sanitize(&mut self) {
        if !self.is_finite() {
            *self = 0.0;
        }
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) {
        if let Some(value) = self {
            value.sanitize();
        }
    }
}

impl<K, V: Sanitize> Sanitize for BTreeMap<K, V> {
    fn sanitize(&mut self) {
        self.values_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize> Sanitize for Outcome<T> {
    fn sanitize(&mut self) {
        if let Outcome::Ok(value) = self {
            value.sanitize();
        }
    }
}

/// Implement `Sanitize` by visiting the listed fields.
macro_rules! sanitize_fields {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl Sanitize for $ty {
            fn sanitize(&mut self) {
                $(self.$field.sanitize();)*
            }
        }
    };
}

sanitize_fields!(FixationEvent { start, end, duration, x_centroid, y_centroid });
sanitize_fields!(LabeledFixation { fixation });
sanitize_fields!(FixationStats {
    avg_duration,
    median_duration,
    min_duration,
    max_duration,
    duration_std,
});
sanitize_fields!(FixationSummary { fixations, stats });
sanitize_fields!(RegionStay { start_time, end_time, duration, centroid_x, centroid_y });
sanitize_fields!(Transition { time, gap_duration });
sanitize_fields!(RegionStats {
    total_duration,
    first_visit,
    last_visit,
    mean_centroid_x,
    mean_centroid_y,
});
sanitize_fields!(TimeRange { start, end, duration });
sanitize_fields!(TimelineResult { sequence, region_stats, timeline, time_range });
sanitize_fields!(ParticipantTimeline { result });
sanitize_fields!(ImageTimelines { participants_data });
sanitize_fields!(DensityMatrix { matrix_raw, matrix_normalized, min_value, max_value });
sanitize_fields!(PatchAttention {});
sanitize_fields!(ImageStats { avg_duration, median_duration });

/// Serialize a sanitized copy of `value`.
pub fn to_json_value<T>(value: &T) -> serde_json::Result<Value>
where
    T: Serialize + Sanitize + Clone,
{
    let mut copy = value.clone();
    copy.sanitize();
    serde_json::to_value(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DensityMode, GroupAxis};

    #[test]
    fn non_finite_values_become_zero() {
        let matrix = DensityMatrix {
            axis: GroupAxis::Participants { image_id: 1 },
            mode: DensityMode::Attention,
            classes: vec!["sky".to_string()],
            columns: vec![1, 2],
            matrix_raw: vec![vec![f64::NAN, f64::INFINITY]],
            matrix_normalized: vec![vec![0.0, 1.0]],
            min_value: f64::NEG_INFINITY,
            max_value: 1.0,
            total_data_points: 2,
        };

        let value = to_json_value(&matrix).unwrap();

        assert_eq!(value["matrix_raw"][0][0], 0.0);
        assert_eq!(value["matrix_raw"][0][1], 0.0);
        assert_eq!(value["min_value"], 0.0);
        assert_eq!(value["axis"]["axis"], "participants");
        // the caller's value is untouched
        assert!(matrix.matrix_raw[0][0].is_nan());
    }

    #[test]
    fn per_key_outcomes_serialize_with_tag() {
        let mut data: BTreeMap<i64, Outcome<TimeRange>> = BTreeMap::new();
        data.insert(1, Outcome::Ok(TimeRange::new(0.0, f64::NAN)));
        data.insert(
            2,
            Outcome::Err(crate::error::AttentionError::no_data(Some(2), Some(0)).report()),
        );
        data.sanitize();

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["1"]["ok"]["end"], 0.0);
        assert_eq!(value["2"]["err"]["kind"], "no_data");
    }
}
