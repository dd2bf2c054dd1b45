//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A point with an oriented unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalPoint3d {
    pub position: Point3d,
    pub normal: Vector3d,
}

impl NormalPoint3d {
    /// Create a new point with a normal
    pub fn new(position: Point3d, normal: Vector3d) -> Self {
        Self { position, normal }
    }
}

impl Default for NormalPoint3d {
    fn default() -> Self {
        Self {
            position: Point3d::origin(),
            normal: Vector3d::new(0.0, 0.0, 1.0),
        }
    }
}
