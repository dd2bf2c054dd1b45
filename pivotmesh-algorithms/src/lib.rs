//! # Pivotmesh Algorithms
//!
//! Spatial search structures and geometric predicates consumed by the
//! reconstruction crates: kd-tree and brute-force nearest neighbor
//! search, four-point coplanarity and segment-segment distance.

pub mod intersection;
pub mod nearest_neighbor;

pub use intersection::*;
pub use nearest_neighbor::*;
