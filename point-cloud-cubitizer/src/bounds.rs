/// Point types and axis-aligned bounds of a point cloud
use serde::{Deserialize, Serialize};

/// Three real coordinates.
pub type Point3 = [f64; 3];

/// A point tagged with a scalar label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub position: Point3,
    pub label: f64,
}

impl LabeledPoint {
    pub fn new(position: Point3, label: f64) -> Self {
        Self { position, label }
    }

    /// Output row `(x, y, z, label)`
    pub fn row(&self) -> [f64; 4] {
        [
            self.position[0],
            self.position[1],
            self.position[2],
            self.label,
        ]
    }
}

/// Elementwise min/max of every point in a cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_xyz: Point3,
    pub max_xyz: Point3,
}

impl BoundingBox {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_xyz: [f64::INFINITY; 3],
            max_xyz: [f64::NEG_INFINITY; 3],
        }
    }

    /// Reduce a whole cloud. Returns `None` when there are no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut bounds = Self::new();
        let mut seen = false;
        for point in points {
            bounds.update(point);
            seen = true;
        }
        seen.then_some(bounds)
    }

    /// Update bounds with a new point
    pub fn update(&mut self, point: &Point3) {
        for d in 0..3 {
            self.min_xyz[d] = self.min_xyz[d].min(point[d]);
            self.max_xyz[d] = self.max_xyz[d].max(point[d]);
        }
    }

    /// `max_xyz - min_xyz`
    pub fn range_xyz(&self) -> Point3 {
        [
            self.max_xyz[0] - self.min_xyz[0],
            self.max_xyz[1] - self.min_xyz[1],
            self.max_xyz[2] - self.min_xyz[2],
        ]
    }

    /// Move a world point into the box's local frame
    pub fn translate(&self, point: &Point3) -> Point3 {
        [
            point[0] - self.min_xyz[0],
            point[1] - self.min_xyz[1],
            point[2] - self.min_xyz[2],
        ]
    }

    /// Closed-interval containment on both corners
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|d| self.min_xyz[d] <= point[d] && point[d] <= self.max_xyz[d])
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}
