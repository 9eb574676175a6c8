use crate::models::{
    GazeSample, LabeledFixation, RegionStay, TimeRange, TimedPoint, TimelineResult, Transition,
};
use crate::semantic::sample_region;
use crate::timeline::config::TimelineConfig;
use crate::timeline::stats::accumulate_region_stats;
use crate::log_warn;

const ENABLE_LOGS: bool = true;

/// Builds region stays and transitions from one (participant, image) stream.
#[derive(Debug, Clone, Default)]
pub struct TimelineBuilder {
    config: TimelineConfig,
}

impl TimelineBuilder {
    pub fn new(config: TimelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn from_fixations(&self, fixations: &[LabeledFixation]) -> TimelineResult {
        timeline_from_fixations(fixations, &self.config)
    }

    pub fn from_samples(&self, samples: &[GazeSample]) -> TimelineResult {
        timeline_from_samples(samples, &self.config)
    }
}

/// A stay still accepting members.
struct OpenStay {
    region: String,
    start: f64,
    end: f64,
    member_count: usize,
    sum_x: f64,
    sum_y: f64,
}

impl OpenStay {
    fn open<T: TimedPoint>(region: String, item: &T) -> Self {
        let (x, y) = item.position();
        Self {
            region,
            start: item.start(),
            end: item.end(),
            member_count: 1,
            sum_x: x,
            sum_y: y,
        }
    }

    fn accepts<T: TimedPoint>(&self, region: &str, item: &T) -> bool {
        self.region == region && item.start() >= self.end
    }

    fn extend<T: TimedPoint>(&mut self, item: &T) {
        let (x, y) = item.position();
        self.end = self.end.max(item.end());
        self.member_count += 1;
        self.sum_x += x;
        self.sum_y += y;
    }

    fn close(self) -> RegionStay {
        let count = self.member_count as f64;
        RegionStay {
            region: self.region,
            start_time: self.start,
            end_time: self.end,
            duration: self.end - self.start,
            member_count: self.member_count,
            centroid_x: self.sum_x / count,
            centroid_y: self.sum_y / count,
        }
    }
}

enum StayState {
    NoCurrentStay,
    InStay(OpenStay),
}

/// Kept stays plus what was rejected along the way.
#[derive(Default)]
struct StayAcceptance {
    kept: Vec<RegionStay>,
    dropped_short: usize,
    dropped_anomalous: usize,
}

impl StayAcceptance {
    fn offer(&mut self, stay: RegionStay, config: &TimelineConfig) {
        // First stay always survives so short recordings still get a timeline
        if self.kept.is_empty() {
            self.kept.push(stay);
            return;
        }

        if stay.duration > config.max_stay_duration {
            log_warn!(
                "dropping anomalous {:.3}s stay in '{}' at t={:.3} (max {:.3}s)",
                stay.duration,
                stay.region,
                stay.start_time,
                config.max_stay_duration
            );
            self.dropped_anomalous += 1;
        } else if stay.duration < config.min_stay_duration {
            self.dropped_short += 1;
        } else {
            self.kept.push(stay);
        }
    }
}

/// Main timeline function: merges same-region items into stays and links them.
///
/// Items are re-sorted by start time (stable) before scanning; the caller's slice is
/// left untouched.
pub fn build_timeline<T, F>(items: &[T], region_of: F, config: &TimelineConfig) -> TimelineResult
where
    T: TimedPoint,
    F: Fn(&T) -> String,
{
    // Edge case: no data for this stream
    if items.is_empty() {
        return TimelineResult::default();
    }

    let mut ordered: Vec<&T> = items.iter().collect();
    ordered.sort_by(|a, b| a.start().total_cmp(&b.start()));

    let mut acceptance = StayAcceptance::default();
    let mut state = StayState::NoCurrentStay;

    for item in &ordered {
        let region = region_of(*item);
        state = match state {
            StayState::InStay(mut stay) if stay.accepts(&region, *item) => {
                stay.extend(*item);
                StayState::InStay(stay)
            }
            StayState::InStay(stay) => {
                acceptance.offer(stay.close(), config);
                StayState::InStay(OpenStay::open(region, *item))
            }
            StayState::NoCurrentStay => StayState::InStay(OpenStay::open(region, *item)),
        };
    }

    // Stream end
    if let StayState::InStay(stay) = state {
        acceptance.offer(stay.close(), config);
    }

    let (sequence, overlapping_transitions) = link_stays(&acceptance.kept);
    let region_stats = accumulate_region_stats(&acceptance.kept);

    let range_start = ordered[0].start();
    let range_end = ordered.iter().map(|item| item.end()).fold(f64::MIN, f64::max);

    TimelineResult {
        total_transitions: sequence.len(),
        unique_regions: region_stats.len(),
        time_range: TimeRange::new(range_start, range_end),
        sequence,
        region_stats,
        timeline: acceptance.kept,
        dropped_short: acceptance.dropped_short,
        dropped_anomalous: acceptance.dropped_anomalous,
        overlapping_transitions,
    }
}

/// Transitions between consecutive kept stays with different regions.
///
/// Negative gaps are reported as-is and counted.
fn link_stays(stays: &[RegionStay]) -> (Vec<Transition>, usize) {
    let mut transitions = Vec::new();
    let mut overlapping = 0;

    for pair in stays.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        if previous.region == next.region {
            continue;
        }

        let transition = Transition {
            from_region: previous.region.clone(),
            to_region: next.region.clone(),
            time: next.start_time,
            gap_duration: next.start_time - previous.end_time,
        };
        if transition.is_overlapping() {
            log_warn!(
                "overlapping stays '{}' -> '{}' at t={:.3} (gap {:.3}s)",
                transition.from_region,
                transition.to_region,
                transition.time,
                transition.gap_duration
            );
            overlapping += 1;
        }
        transitions.push(transition);
    }

    (transitions, overlapping)
}

pub fn timeline_from_fixations(
    fixations: &[LabeledFixation],
    config: &TimelineConfig,
) -> TimelineResult {
    build_timeline(fixations, |fixation| fixation.region.clone(), config)
}

/// Raw-sample timeline; the region is each sample's own class, or "unknown".
pub fn timeline_from_samples(samples: &[GazeSample], config: &TimelineConfig) -> TimelineResult {
    build_timeline(samples, sample_region, config)
}
