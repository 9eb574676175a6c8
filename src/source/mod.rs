mod table;

pub use table::SampleTable;

use crate::models::GazeSample;

/// Tabular provider of raw gaze samples.
pub trait GazeSource: Send + Sync {
    /// Samples matching the given filters; `None` leaves that key unfiltered.
    fn samples(&self, participant_id: Option<i64>, image_id: Option<i64>) -> Vec<GazeSample>;

    /// Participants with at least one sample on the image, ascending.
    fn participants_for_image(&self, image_id: i64) -> Vec<i64>;

    /// Images the participant has at least one sample on, ascending.
    fn images_for_participant(&self, participant_id: i64) -> Vec<i64>;
}
