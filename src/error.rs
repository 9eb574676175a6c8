//! Error taxonomy shared by every query surface.
//!
//! Only "no data at all" style failures propagate to callers. Missing labels,
//! degenerate area ratios and anomalous stays are resolved where they occur.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AttentionError {
    #[error("No data found for participant {participant:?}, image {image:?}")]
    NoData {
        participant: Option<i64>,
        image: Option<i64>,
    },

    #[error("Unsupported patch size {0}px (expected 10, 20 or 40)")]
    UnsupportedPatchSize(u32),

    #[error("Invalid gaze sample at row {row}: {reason}")]
    InvalidSample { row: usize, reason: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AttentionError {
    pub fn no_data(participant: Option<i64>, image: Option<i64>) -> Self {
        AttentionError::NoData { participant, image }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AttentionError::NoData { .. } => "no_data",
            AttentionError::UnsupportedPatchSize(_) => "unsupported_patch_size",
            AttentionError::InvalidSample { .. } => "invalid_sample",
            AttentionError::InvalidSettings(_) => "invalid_settings",
            AttentionError::Storage(_) => "storage",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind().to_string(),
            reason: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AttentionError>;

/// Serializable error object handed to callers instead of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub reason: String,
}

/// Result reported for a single key inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome<T> {
    Ok(T),
    Err(ErrorReport),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Err(_) => None,
        }
    }

    pub fn err(&self) -> Option<&ErrorReport> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err(report) => Some(report),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(err) => Outcome::Err(err.report()),
        }
    }
}
