//! Core traits for pivotmesh

use crate::point::Point3d;

/// Trait for nearest neighbor search over an indexed point set
///
/// Implementations index a fixed point sequence; the returned indices
/// refer into that sequence. Both queries return results sorted by
/// distance, ties broken by index, so that consumers iterating the
/// result order behave deterministically.
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point as (index, distance)
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)>;

    /// Find all neighbors within a given radius as (index, squared distance)
    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)>;
}
