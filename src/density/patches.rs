use std::collections::{BTreeMap, BTreeSet};

use crate::models::{LabeledFixation, PatchAttention};
use crate::semantic::PatchGrid;

/// Fixation counts per participant and patch for one image.
///
/// Rows follow ascending participant id. Fixations without a patch, or with an index
/// beyond the grid, are ignored.
pub fn patch_attention_matrix(
    fixations: &[LabeledFixation],
    image_id: i64,
    grid: &PatchGrid,
) -> PatchAttention {
    let total_patches = grid.total_patches();
    let mut rows: BTreeMap<i64, Vec<u32>> = BTreeMap::new();
    let mut active: BTreeSet<usize> = BTreeSet::new();
    let mut total_fixations = 0;

    for labelled in fixations {
        let fixation = &labelled.fixation;
        if fixation.image_id != image_id {
            continue;
        }
        let row = rows
            .entry(fixation.participant_id)
            .or_insert_with(|| vec![0; total_patches]);

        let Some(index) = labelled.patch_index.filter(|index| *index < total_patches) else {
            continue;
        };
        row[index] += 1;
        active.insert(index);
        total_fixations += 1;
    }

    PatchAttention {
        image_id,
        patch_size: grid.patch_size.pixels(),
        cols: grid.cols(),
        rows: grid.rows(),
        total_patches,
        participants: rows.keys().copied().collect(),
        matrix: rows.into_values().collect(),
        total_fixations,
        active_patches: active.len(),
    }
}
