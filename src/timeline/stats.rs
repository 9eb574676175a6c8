use std::collections::BTreeMap;

use crate::models::{RegionStats, RegionStay};

/// Fold kept stays, in temporal order, into per-region aggregates.
///
/// The centroid is a running pairwise average of stay centroids, so later stays weigh
/// more than earlier ones.
pub fn accumulate_region_stats(stays: &[RegionStay]) -> BTreeMap<String, RegionStats> {
    let mut stats: BTreeMap<String, RegionStats> = BTreeMap::new();

    for stay in stays {
        match stats.get_mut(&stay.region) {
            Some(region) => {
                region.visit_count += 1;
                region.total_duration += stay.duration;
                region.member_count += stay.member_count;
                region.first_visit = region.first_visit.min(stay.start_time);
                region.last_visit = region.last_visit.max(stay.end_time);
                region.mean_centroid_x = (region.mean_centroid_x + stay.centroid_x) / 2.0;
                region.mean_centroid_y = (region.mean_centroid_y + stay.centroid_y) / 2.0;
            }
            None => {
                stats.insert(
                    stay.region.clone(),
                    RegionStats {
                        visit_count: 1,
                        total_duration: stay.duration,
                        member_count: stay.member_count,
                        first_visit: stay.start_time,
                        last_visit: stay.end_time,
                        mean_centroid_x: stay.centroid_x,
                        mean_centroid_y: stay.centroid_y,
                    },
                );
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stay(region: &str, start: f64, end: f64, x: f64) -> RegionStay {
        RegionStay {
            region: region.to_string(),
            start_time: start,
            end_time: end,
            duration: end - start,
            member_count: 2,
            centroid_x: x,
            centroid_y: 0.0,
        }
    }

    #[test]
    fn centroid_is_running_pairwise_average() {
        let stays = vec![
            stay("sky", 0.0, 1.0, 0.0),
            stay("road", 1.0, 2.0, 50.0),
            stay("sky", 2.0, 3.0, 100.0),
            stay("sky", 3.5, 4.0, 200.0),
        ];

        let stats = accumulate_region_stats(&stays);
        let sky = &stats["sky"];

        // ((0 + 100) / 2 + 200) / 2, not the plain mean of 100
        assert_eq!(sky.mean_centroid_x, 125.0);
        assert_eq!(sky.visit_count, 3);
        assert_eq!(sky.member_count, 6);
        assert_eq!(sky.total_duration, 2.5);
        assert_eq!(sky.first_visit, 0.0);
        assert_eq!(sky.last_visit, 4.0);
        assert_eq!(stats["road"].visit_count, 1);
    }
}
