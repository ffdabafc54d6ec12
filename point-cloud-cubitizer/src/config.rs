/// Immutable cubitization parameters shared by every cloud in a run
use crate::error::{CubitizeError, Result};
use serde::{Deserialize, Serialize};

/// Grid and output policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubitizerConfig {
    /// Cube extent per axis.
    pub cubic_size: [f64; 3],
    /// Fraction of a cube shared with its neighbour, per axis.
    pub overlap: [f64; 3],
    /// Bins with this many points or fewer are dropped; larger bins are
    /// subsampled down to it. Zero keeps every non-empty bin unchanged.
    pub min_num_of_point: usize,
    /// Prefix each record with its min/max corner rows.
    pub store_boundary: bool,
}

impl CubitizerConfig {
    pub fn new(cubic_size: [f64; 3], overlap: [f64; 3], min_num_of_point: usize) -> Self {
        Self {
            cubic_size,
            overlap,
            min_num_of_point,
            store_boundary: false,
        }
    }

    pub fn with_store_boundary(mut self, store_boundary: bool) -> Self {
        self.store_boundary = store_boundary;
        self
    }

    /// Reject settings that would make the slide step non-positive.
    pub fn validate(&self) -> Result<()> {
        for (d, axis) in AXES.iter().enumerate() {
            let size = self.cubic_size[d];
            if !size.is_finite() || size <= 0.0 {
                return Err(CubitizeError::config(format!(
                    "cubic size on {axis} must be positive, got {size}"
                )));
            }

            let overlap = self.overlap[d];
            if !overlap.is_finite() || !(0.0..1.0).contains(&overlap) {
                return Err(CubitizeError::config(format!(
                    "overlap on {axis} must be in [0, 1), got {overlap}"
                )));
            }
        }
        Ok(())
    }

    /// `(1 - overlap) * cubic_size`, componentwise
    pub fn slide_step(&self) -> [f64; 3] {
        [
            (1.0 - self.overlap[0]) * self.cubic_size[0],
            (1.0 - self.overlap[1]) * self.cubic_size[1],
            (1.0 - self.overlap[2]) * self.cubic_size[2],
        ]
    }
}

pub(crate) const AXES: [&str; 3] = ["x", "y", "z"];
