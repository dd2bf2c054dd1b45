//! Point cloud data structures and functionality

use crate::error::Error;
use crate::point::*;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// An oriented point cloud: positions with optional per-point normals and colors
///
/// Normals are required by surface reconstruction; colors are carried
/// through to the output mesh when present. Attribute vectors, when set,
/// have the same length as `points`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point3d>,
    pub normals: Option<Vec<Vector3d>>,
    pub colors: Option<Vec<[u8; 3]>>,
}

impl PointCloud {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            normals: None,
            colors: None,
        }
    }

    /// Create a point cloud from a vector of positions, without normals
    pub fn from_points(points: Vec<Point3d>) -> Self {
        Self {
            points,
            normals: None,
            colors: None,
        }
    }

    /// Create a point cloud from positions and matching normals
    pub fn from_points_and_normals(points: Vec<Point3d>, normals: Vec<Vector3d>) -> Result<Self> {
        if normals.len() != points.len() {
            return Err(Error::InvalidData(format!(
                "normal count {} does not match point count {}",
                normals.len(),
                points.len()
            )));
        }
        Ok(Self {
            points,
            normals: Some(normals),
            colors: None,
        })
    }

    /// Create a point cloud from oriented points
    pub fn from_normal_points(points: Vec<NormalPoint3d>) -> Self {
        let (points, normals): (Vec<_>, Vec<_>) =
            points.into_iter().map(|p| (p.position, p.normal)).unzip();
        Self {
            points,
            normals: Some(normals),
            colors: None,
        }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check whether every point carries a normal
    pub fn has_normals(&self) -> bool {
        self.normals
            .as_ref()
            .is_some_and(|n| n.len() == self.points.len())
    }

    /// Check whether every point carries a color
    pub fn has_colors(&self) -> bool {
        self.colors
            .as_ref()
            .is_some_and(|c| c.len() == self.points.len())
    }

    /// Add a position-only point to the cloud
    pub fn push(&mut self, point: Point3d) {
        self.points.push(point);
    }

    /// Set per-point normals
    pub fn set_normals(&mut self, normals: Vec<Vector3d>) -> Result<()> {
        if normals.len() != self.points.len() {
            return Err(Error::InvalidData(format!(
                "normal count {} does not match point count {}",
                normals.len(),
                self.points.len()
            )));
        }
        self.normals = Some(normals);
        Ok(())
    }

    /// Set per-point colors
    pub fn set_colors(&mut self, colors: Vec<[u8; 3]>) -> Result<()> {
        if colors.len() != self.points.len() {
            return Err(Error::InvalidData(format!(
                "color count {} does not match point count {}",
                colors.len(),
                self.points.len()
            )));
        }
        self.colors = Some(colors);
        Ok(())
    }

    /// Get an iterator over the positions
    pub fn iter(&self) -> std::slice::Iter<Point3d> {
        self.points.iter()
    }

    /// Clear all points and attributes from the cloud
    pub fn clear(&mut self) {
        self.points.clear();
        self.normals = None;
        self.colors = None;
    }
}

impl Index<usize> for PointCloud {
    type Output = Point3d;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IndexMut<usize> for PointCloud {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3d;
    type IntoIter = std::slice::Iter<'a, Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl Extend<Point3d> for PointCloud {
    fn extend<I: IntoIterator<Item = Point3d>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl FromIterator<Point3d> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self::from_points(Vec::from_iter(iter))
    }
}

impl FromIterator<NormalPoint3d> for PointCloud {
    fn from_iter<I: IntoIterator<Item = NormalPoint3d>>(iter: I) -> Self {
        Self::from_normal_points(Vec::from_iter(iter))
    }
}
