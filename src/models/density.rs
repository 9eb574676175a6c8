use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityMode {
    /// Dwell time divided by the class's share of the image area.
    Attention,
    /// Raw dwell time.
    Time,
}

impl Default for DensityMode {
    fn default() -> Self {
        DensityMode::Attention
    }
}

/// Which key spans the matrix columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "axis", rename_all = "lowercase")]
pub enum GroupAxis {
    /// Columns are participants, all on one image.
    Participants { image_id: i64 },
    /// Columns are images, all viewed by one participant.
    Images { participant_id: i64 },
}

impl GroupAxis {
    /// Column key of a sample or fixation, `None` if it is outside the fixed context.
    pub fn column_of(&self, participant_id: i64, image_id: i64) -> Option<i64> {
        match *self {
            GroupAxis::Participants { image_id: fixed } if fixed == image_id => {
                Some(participant_id)
            }
            GroupAxis::Images {
                participant_id: fixed,
            } if fixed == participant_id => Some(image_id),
            _ => None,
        }
    }

    /// Image that a given column refers to.
    pub fn image_of(&self, column: i64) -> i64 {
        match *self {
            GroupAxis::Participants { image_id } => image_id,
            GroupAxis::Images { .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityMatrix {
    pub axis: GroupAxis,
    pub mode: DensityMode,
    /// Rows, ranked by total dwell time.
    pub classes: Vec<String>,
    /// Columns, in requested order.
    pub columns: Vec<i64>,
    pub matrix_raw: Vec<Vec<f64>>,
    pub matrix_normalized: Vec<Vec<f64>>,
    pub min_value: f64,
    pub max_value: f64,
    pub total_data_points: usize,
}

impl DensityMatrix {
    pub fn shape(&self) -> (usize, usize) {
        (self.classes.len(), self.columns.len())
    }

    pub fn raw(&self, class: &str, column: i64) -> Option<f64> {
        let row = self.classes.iter().position(|c| c == class)?;
        let col = self.columns.iter().position(|c| *c == column)?;
        Some(self.matrix_raw[row][col])
    }
}

/// Per-participant fixation counts over the patch grid of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchAttention {
    pub image_id: i64,
    pub patch_size: u32,
    pub cols: usize,
    pub rows: usize,
    pub total_patches: usize,
    pub participants: Vec<i64>,
    pub matrix: Vec<Vec<u32>>,
    pub total_fixations: usize,
    pub active_patches: usize,
}
