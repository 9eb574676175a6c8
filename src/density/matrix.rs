use crate::density::dwell::DwellTable;
use crate::density::ratios::AreaRatios;
use crate::error::{AttentionError, Result};
use crate::models::{DensityMatrix, DensityMode, GroupAxis};

/// Turns dwell tables into ranked, normalised class x column matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityAggregator {
    pub top_n: usize,
    pub mode: DensityMode,
}

impl DensityAggregator {
    pub fn new(top_n: usize, mode: DensityMode) -> Self {
        Self { top_n, mode }
    }

    pub fn aggregate(
        &self,
        table: &DwellTable,
        axis: &GroupAxis,
        columns: &[i64],
        ratios: &AreaRatios,
    ) -> Result<DensityMatrix> {
        aggregate(table, axis, columns, ratios, self.top_n, self.mode)
    }
}

/// Dwell time divided by area ratio; a missing, zero or non-finite ratio keeps raw time.
pub fn density(time: f64, ratio: Option<f64>) -> f64 {
    match ratio {
        Some(ratio) if ratio.is_finite() && ratio > 0.0 => time / ratio,
        _ => time,
    }
}

/// Global min-max scaling; a constant matrix is returned unchanged.
pub fn normalize_min_max(raw: &[Vec<f64>]) -> (Vec<Vec<f64>>, f64, f64) {
    let mut cells = raw.iter().flatten().copied().peekable();
    if cells.peek().is_none() {
        return (raw.to_vec(), 0.0, 0.0);
    }

    let (min, max) = cells.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if max > min {
        let span = max - min;
        let normalized = raw
            .iter()
            .map(|row| row.iter().map(|v| (v - min) / span).collect())
            .collect();
        (normalized, min, max)
    } else {
        (raw.to_vec(), min, max)
    }
}

/// Main aggregation function: ranks classes and builds a zero-filled matrix.
///
/// Rows are the `top_n` classes by total dwell over `columns`, ties kept in first-seen
/// order; columns follow the requested order, including ones without any data.
pub fn aggregate(
    table: &DwellTable,
    axis: &GroupAxis,
    columns: &[i64],
    ratios: &AreaRatios,
    top_n: usize,
    mode: DensityMode,
) -> Result<DensityMatrix> {
    let table = table.restrict_to(columns);

    // Edge case: nothing recorded for any requested column
    if table.is_empty() {
        return Err(no_data_for(axis));
    }

    let mut ranked: Vec<(&String, f64)> = table
        .classes()
        .iter()
        .map(|class| {
            let total = columns.iter().map(|&column| table.time(column, class)).sum::<f64>();
            (class, total)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_n);

    let classes: Vec<String> = ranked.into_iter().map(|(class, _)| class.clone()).collect();

    let matrix_raw: Vec<Vec<f64>> = classes
        .iter()
        .map(|class| {
            columns
                .iter()
                .map(|&column| {
                    let time = table.time(column, class);
                    match mode {
                        DensityMode::Time => time,
                        DensityMode::Attention => {
                            density(time, ratios.get(axis.image_of(column), class))
                        }
                    }
                })
                .collect()
        })
        .collect();

    let (matrix_normalized, min_value, max_value) = normalize_min_max(&matrix_raw);

    Ok(DensityMatrix {
        axis: *axis,
        mode,
        classes,
        columns: columns.to_vec(),
        matrix_raw,
        matrix_normalized,
        min_value,
        max_value,
        total_data_points: table.data_points(),
    })
}

fn no_data_for(axis: &GroupAxis) -> AttentionError {
    match *axis {
        GroupAxis::Participants { image_id } => AttentionError::no_data(None, Some(image_id)),
        GroupAxis::Images { participant_id } => AttentionError::no_data(Some(participant_id), None),
    }
}
