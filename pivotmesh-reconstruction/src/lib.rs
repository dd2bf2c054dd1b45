//! # Pivotmesh Reconstruction
//!
//! Surface reconstruction from oriented point clouds using the
//! ball-pivoting algorithm: a virtual ball of a given radius rolls over
//! the point set, and every triple of points it comes to rest on becomes
//! a triangle of the output mesh.

pub mod ball_pivoting;

pub use ball_pivoting::*;
