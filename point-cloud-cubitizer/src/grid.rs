/// Sliding-cube grid geometry
use crate::bounds::{BoundingBox, Point3};
use crate::config::CubitizerConfig;
use crate::constants::MAX_TOTAL_BINS;
use crate::error::{CubitizeError, Result};
use serde::{Deserialize, Serialize};

/// Grid geometry for one point cloud. Immutable once computed.
///
/// [`GridSpec::dimension`] derives the grid once per cloud from its bounding
/// box. Bins are addressed by a linear index running x fastest, then y, then
/// z; [`GridSpec::decode`] and [`GridSpec::encode`] are exact inverses over
/// `0..total_bins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub cubic_size: [f64; 3],
    pub overlap: [f64; 3],
    pub slide_step: [f64; 3],
    pub num_bins_per_axis: [usize; 3],
    pub total_bins: usize,
}

/// World-space corners of one bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinBoundary {
    pub min_bd: Point3,
    pub max_bd: Point3,
}

impl BinBoundary {
    /// Closed-interval containment on both corners
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|d| self.min_bd[d] <= point[d] && point[d] <= self.max_bd[d])
    }
}

impl GridSpec {
    /// Compute bounds and grid geometry for a whole cloud.
    pub fn dimension(
        points: &[Point3],
        config: &CubitizerConfig,
    ) -> Result<(GridSpec, BoundingBox)> {
        config.validate()?;

        // f64::min/max skip NaN, so bounds alone would not catch it
        if let Some(i) = points.iter().position(|p| !p.iter().all(|v| v.is_finite())) {
            return Err(CubitizeError::config(format!(
                "point {i} has non-finite coordinates {:?}",
                points[i]
            )));
        }

        let bounds = BoundingBox::from_points(points.iter())
            .ok_or_else(|| CubitizeError::config("point cloud is empty"))?;

        Ok((Self::from_bounds(&bounds, config)?, bounds))
    }

    /// Grid geometry for already known bounds. `config` must be valid.
    ///
    /// Fails when the grid would exceed [`MAX_TOTAL_BINS`].
    pub fn from_bounds(bounds: &BoundingBox, config: &CubitizerConfig) -> Result<Self> {
        let range = bounds.range_xyz();
        let slide_step = config.slide_step();

        let mut num_bins_per_axis = [1usize; 3];
        for d in 0..3 {
            let steps = ((range[d] - config.cubic_size[d]) / slide_step[d]).ceil() + 1.0;
            if !(steps <= MAX_TOTAL_BINS as f64) {
                return Err(too_many_bins(range, config));
            }
            num_bins_per_axis[d] = steps.max(1.0) as usize;
        }

        let total_bins = num_bins_per_axis
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .filter(|&total| total <= MAX_TOTAL_BINS)
            .ok_or_else(|| too_many_bins(range, config))?;

        Ok(Self {
            cubic_size: config.cubic_size,
            overlap: config.overlap,
            slide_step,
            num_bins_per_axis,
            total_bins,
        })
    }

    fn plane(&self) -> usize {
        self.num_bins_per_axis[0] * self.num_bins_per_axis[1]
    }

    /// Grid coordinate to linear index
    #[inline]
    pub fn encode(&self, coord: [usize; 3]) -> usize {
        coord[0] + coord[1] * self.num_bins_per_axis[0] + coord[2] * self.plane()
    }

    /// Linear index to grid coordinate
    #[inline]
    pub fn decode(&self, index: usize) -> [usize; 3] {
        let nx = self.num_bins_per_axis[0];
        let nxy = self.plane();
        let z = index / nxy;
        let y = (index - z * nxy) / nx;
        let x = index - z * nxy - y * nx;
        [x, y, z]
    }

    /// World corners of bin `index`
    pub fn boundary(&self, index: usize, bounds: &BoundingBox) -> BinBoundary {
        let coord = self.decode(index);
        let mut min_bd = [0.0; 3];
        let mut max_bd = [0.0; 3];
        for d in 0..3 {
            min_bd[d] = coord[d] as f64 * self.slide_step[d] + bounds.min_xyz[d];
            max_bd[d] = min_bd[d] + self.cubic_size[d];
        }
        BinBoundary { min_bd, max_bd }
    }
}

fn too_many_bins(range: Point3, config: &CubitizerConfig) -> CubitizeError {
    CubitizeError::config(format!(
        "range {range:?} with cubic size {:?} needs more than {MAX_TOTAL_BINS} bins",
        config.cubic_size
    ))
}
