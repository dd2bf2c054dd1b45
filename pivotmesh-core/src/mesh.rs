//! Mesh data structures and functionality

use crate::error::Error;
use crate::point::*;
use crate::Result;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices and faces
///
/// Vertex normals, vertex colors and per-face normals are optional
/// attributes. Surface reconstruction fills `face_normals` with one unit
/// normal per emitted face, in face order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3d>>,
    pub colors: Option<Vec<[u8; 3]>>,
    pub face_normals: Option<Vec<Vector3d>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3d>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
            colors: None,
            face_normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has no faces
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh, returning its index
    pub fn add_vertex(&mut self, vertex: Point3d) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Calculate face normals from the current winding
    pub fn calculate_face_normals(&self) -> Vec<Vector3d> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let normal = (v1 - v0).cross(&(v2 - v0));
                let norm = normal.norm();
                if norm > 0.0 {
                    normal / norm
                } else {
                    Vector3d::zeros()
                }
            })
            .collect()
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3d>) -> Result<()> {
        if normals.len() != self.vertices.len() {
            return Err(Error::InvalidData(format!(
                "normal count {} does not match vertex count {}",
                normals.len(),
                self.vertices.len()
            )));
        }
        self.normals = Some(normals);
        Ok(())
    }

    /// Set vertex colors
    pub fn set_colors(&mut self, colors: Vec<[u8; 3]>) -> Result<()> {
        if colors.len() != self.vertices.len() {
            return Err(Error::InvalidData(format!(
                "color count {} does not match vertex count {}",
                colors.len(),
                self.vertices.len()
            )));
        }
        self.colors = Some(colors);
        Ok(())
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.normals = None;
        self.colors = None;
        self.face_normals = None;
    }
}
