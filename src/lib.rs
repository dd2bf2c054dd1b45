//! # Pivotmesh
//!
//! Ball-pivoting surface reconstruction for 3D point clouds.
//!
//! This is the umbrella crate that provides convenient access to the
//! pivotmesh crates. You can use this crate to get everything in one
//! place, or depend on the individual crates for more granular control
//! over dependencies.
//!
//! ## Quick Start
//!
//! ```rust
//! use pivotmesh::prelude::*;
//!
//! // An oriented point cloud: positions plus unit normals
//! let cloud = PointCloud::from_points_and_normals(
//!     vec![
//!         Point3d::new(0.0, 0.0, 0.0),
//!         Point3d::new(1.0, 0.0, 0.0),
//!         Point3d::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![Vector3d::new(0.0, 0.0, 1.0); 3],
//! )?;
//!
//! // Roll a ball over the cloud to get a triangle mesh
//! let mesh = ball_pivoting_reconstruction(&cloud, &[0.75])?;
//! assert_eq!(mesh.face_count(), 1);
//! # Ok::<(), pivotmesh::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: enables `algorithms` and `reconstruction`
//! - `algorithms`: spatial search and geometric predicates
//! - `reconstruction`: the ball-pivoting engine

// Re-export core functionality
pub use pivotmesh_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use pivotmesh_algorithms as algorithms;

#[cfg(feature = "reconstruction")]
pub use pivotmesh_reconstruction as reconstruction;

/// Convenient imports for common use cases
pub mod prelude {
    pub use pivotmesh_core::*;

    #[cfg(feature = "algorithms")]
    pub use pivotmesh_algorithms::*;

    #[cfg(feature = "reconstruction")]
    pub use pivotmesh_reconstruction::*;
}
