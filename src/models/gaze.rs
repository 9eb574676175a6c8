//! Raw gaze sample model.
//!
//! One row of the tabular source: where a participant was looking on an image at a
//! given instant, plus the semantic class and area ratio resolved upstream.

use serde::{Deserialize, Serialize};

use crate::error::{AttentionError, Result};
use crate::models::TimedPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub participant_id: i64,
    pub image_id: i64,
    /// Seconds, monotonic within a participant x image block.
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub semantic_class: Option<String>,
    pub class_area_ratio: Option<f64>,
}

impl GazeSample {
    pub fn new(participant_id: i64, image_id: i64, t: f64, x: f64, y: f64) -> Self {
        Self {
            participant_id,
            image_id,
            t,
            x,
            y,
            semantic_class: None,
            class_area_ratio: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>, area_ratio: Option<f64>) -> Self {
        self.semantic_class = Some(class.into());
        self.class_area_ratio = area_ratio;
        self
    }

    /// Label with blank strings treated the same as a missing label.
    pub fn label(&self) -> Option<&str> {
        self.semantic_class
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    pub fn block(&self) -> (i64, i64) {
        (self.participant_id, self.image_id)
    }
}

impl TimedPoint for GazeSample {
    fn start(&self) -> f64 {
        self.t
    }

    fn end(&self) -> f64 {
        self.t
    }

    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Rejects rows with non-finite time or coordinates.
///
/// Runs at ingestion, before anything reaches the detector.
pub fn validate_samples(samples: &[GazeSample]) -> Result<()> {
    for (row, sample) in samples.iter().enumerate() {
        let fields = [("t", sample.t), ("x", sample.x), ("y", sample.y)];
        if let Some((name, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(AttentionError::InvalidSample {
                row,
                reason: format!("{name} is not finite ({value})"),
            });
        }
    }
    Ok(())
}
