pub mod density;
pub mod fixation;
pub mod gaze;
pub mod timeline;

pub use density::{DensityMatrix, DensityMode, GroupAxis, PatchAttention};
pub use fixation::{FixationEvent, FixationSource, FixationStats, FixationSummary, LabeledFixation};
pub use gaze::{validate_samples, GazeSample};
pub use timeline::{
    DataKind, ImageTimelines, ParticipantTimeline, RegionStats, RegionStay, TimeRange,
    TimelineResult, Transition,
};

/// Anything that occupies an interval of time at a screen position.
///
/// Raw samples are instantaneous (`start == end`); fixations span an interval.
pub trait TimedPoint {
    fn start(&self) -> f64;
    fn end(&self) -> f64;
    fn position(&self) -> (f64, f64);
}

impl<T: TimedPoint + ?Sized> TimedPoint for &T {
    fn start(&self) -> f64 {
        (**self).start()
    }

    fn end(&self) -> f64 {
        (**self).end()
    }

    fn position(&self) -> (f64, f64) {
        (**self).position()
    }
}
