/// The 128×64 monochrome bitmap
///
/// The logical resolution is a protocol constant shared with the pipeline.
/// It is never inferred from the size of the preview image.

use std::fmt;

use image::{imageops::FilterType, DynamicImage};

use super::overrides::OverrideSet;

/// Logical bitmap width in cells
pub const GRID_WIDTH: u32 = 128;
/// Logical bitmap height in cells
pub const GRID_HEIGHT: u32 = 64;

/// Red channel values above this count as a lit cell
const SAMPLE_CUTOFF: u8 = 127;

/// Row-major grid of lit cells
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    cells: Vec<bool>,
}

impl Bitmap {
    /// An all-dark bitmap
    pub fn new() -> Self {
        Self {
            cells: vec![false; (GRID_WIDTH * GRID_HEIGHT) as usize],
        }
    }

    /// Sample a pipeline preview raster.
    ///
    /// The image is drawn at exactly 128×64 (nearest neighbour, so an
    /// already-sized preview is sampled 1:1) and each cell's red channel is
    /// compared against the cutoff.
    pub fn from_preview(preview: &DynamicImage) -> Self {
        let sized = preview
            .resize_exact(GRID_WIDTH, GRID_HEIGHT, FilterType::Nearest)
            .to_rgba8();

        let mut bitmap = Self::new();
        for (x, y, pixel) in sized.enumerate_pixels() {
            bitmap.set(x, y, pixel[0] > SAMPLE_CUTOFF);
        }
        bitmap
    }

    fn index(x: u32, y: u32) -> Option<usize> {
        if x < GRID_WIDTH && y < GRID_HEIGHT {
            Some((y * GRID_WIDTH + x) as usize)
        } else {
            None
        }
    }

    /// Cell value; out-of-range coordinates read as dark
    pub fn get(&self, x: u32, y: u32) -> bool {
        Self::index(x, y).map(|i| self.cells[i]).unwrap_or(false)
    }

    /// Set a cell; out-of-range coordinates are ignored
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if let Some(i) = Self::index(x, y) {
            self.cells[i] = value;
        }
    }

    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|&&lit| lit).count()
    }

    /// Apply manual overrides on top of this (sampled) bitmap.
    ///
    /// force_on is applied before force_off, matching the pipeline. With
    /// disjoint sets the order does not matter.
    pub fn with_overrides(&self, overrides: &OverrideSet) -> Self {
        let mut effective = self.clone();
        for &(x, y) in &overrides.force_on {
            if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
                effective.set(x, y, true);
            }
        }
        for &(x, y) in &overrides.force_off {
            if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
                effective.set(x, y, false);
            }
        }
        effective
    }

    /// Iterate over lit cells as `(x, y)`
    pub fn lit_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &lit)| lit)
            .map(|(i, _)| (i as u32 % GRID_WIDTH, i as u32 / GRID_WIDTH))
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("size", &(GRID_WIDTH, GRID_HEIGHT))
            .field("lit", &self.count_on())
            .finish()
    }
}
