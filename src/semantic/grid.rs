use serde::{Deserialize, Serialize};

use crate::error::{AttentionError, Result};
use crate::fixation::PixelBounds;

/// Supported square patch edge lengths in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PatchSize {
    Px10,
    Px20,
    Px40,
}

impl PatchSize {
    pub const ALL: [PatchSize; 3] = [PatchSize::Px10, PatchSize::Px20, PatchSize::Px40];

    pub fn pixels(self) -> u32 {
        match self {
            PatchSize::Px10 => 10,
            PatchSize::Px20 => 20,
            PatchSize::Px40 => 40,
        }
    }
}

impl TryFrom<u32> for PatchSize {
    type Error = AttentionError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            10 => Ok(PatchSize::Px10),
            20 => Ok(PatchSize::Px20),
            40 => Ok(PatchSize::Px40),
            other => Err(AttentionError::UnsupportedPatchSize(other)),
        }
    }
}

impl From<PatchSize> for u32 {
    fn from(size: PatchSize) -> Self {
        size.pixels()
    }
}

/// Square grid laid over an image, with row 0 at the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchGrid {
    pub patch_size: PatchSize,
    pub image_width: u32,
    pub image_height: u32,
}

impl PatchGrid {
    pub fn new(patch_size: PatchSize, image_width: u32, image_height: u32) -> Self {
        Self {
            patch_size,
            image_width,
            image_height,
        }
    }

    pub fn cols(&self) -> usize {
        (self.image_width / self.patch_size.pixels()) as usize
    }

    pub fn rows(&self) -> usize {
        (self.image_height / self.patch_size.pixels()) as usize
    }

    pub fn total_patches(&self) -> usize {
        self.cols() * self.rows()
    }

    /// Patch containing pixel `(x, y)`, or `None` outside the grid.
    ///
    /// `y` is measured from the top edge; patch rows count up from the bottom, so
    /// `y == 0` falls just past the last row.
    pub fn patch_index(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let size = self.patch_size.pixels() as f64;
        let patch_x = (x / size).floor();
        let patch_y = ((self.image_height as f64 - y) / size).floor();

        if patch_x < 0.0 || patch_y < 0.0 {
            return None;
        }
        let (patch_x, patch_y) = (patch_x as usize, patch_y as usize);
        if patch_x >= self.cols() || patch_y >= self.rows() {
            return None;
        }

        Some(patch_y * self.cols() + patch_x)
    }

    /// Pixel rectangle covered by a patch, in top-left image coordinates.
    pub fn patch_bounds(&self, index: usize) -> Option<PixelBounds> {
        if index >= self.total_patches() {
            return None;
        }

        let size = self.patch_size.pixels() as f64;
        let patch_x = (index % self.cols()) as f64;
        let patch_y = (index / self.cols()) as f64;
        let height = self.image_height as f64;

        Some(PixelBounds {
            x_min: patch_x * size,
            x_max: (patch_x + 1.0) * size,
            y_min: height - (patch_y + 1.0) * size,
            y_max: height - patch_y * size,
        })
    }
}
