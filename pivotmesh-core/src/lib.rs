//! Core data structures and traits for pivotmesh
//!
//! This crate provides the fundamental types for ball-pivoting surface
//! reconstruction: points, point clouds, triangle meshes, the nearest
//! neighbor search seam, and the common error type.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// Common result type for pivotmesh operations
pub type Result<T> = std::result::Result<T, Error>;
