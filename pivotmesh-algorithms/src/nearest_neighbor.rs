//! Nearest neighbor search implementations

use kiddo::SquaredEuclidean;
use pivotmesh_core::{NearestNeighborSearch, Point3d};
use std::cmp::Ordering;

fn sort_deterministic(results: &mut Vec<(usize, f64)>) {
    results.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

/// KD-Tree for nearest neighbor search
///
/// Wraps a `kiddo` tree over a fixed point slice. Queries run in
/// O(log n) and return results sorted by (distance, index).
pub struct KdTree {
    tree: kiddo::KdTree<f64, 3>,
    len: usize,
}

impl KdTree {
    /// Build a tree over the given points; indices refer into the slice
    pub fn new(points: &[Point3d]) -> Self {
        let mut tree = kiddo::KdTree::new();
        for (i, point) in points.iter().enumerate() {
            tree.add(&[point.x, point.y, point.z], i as u64);
        }
        Self {
            tree,
            len: points.len(),
        }
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl NearestNeighborSearch for KdTree {
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        let mut results: Vec<(usize, f64)> = self
            .tree
            .nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], k)
            .into_iter()
            .map(|n| (n.item as usize, n.distance.sqrt()))
            .collect();
        sort_deterministic(&mut results);
        results
    }

    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        let mut results: Vec<(usize, f64)> = self
            .tree
            .within::<SquaredEuclidean>(&[query.x, query.y, query.z], radius * radius)
            .into_iter()
            .map(|n| (n.item as usize, n.distance))
            .collect();
        sort_deterministic(&mut results);
        results
    }
}

/// Brute force nearest neighbor search for small datasets
///
/// Same result contract as [`KdTree`], at O(n) per query.
pub struct BruteForceSearch {
    points: Vec<Point3d>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3d]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        let mut results: Vec<(usize, f64)> = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, point)| (idx, (point - query).norm()))
            .collect();
        sort_deterministic(&mut results);
        results.truncate(k);
        results
    }

    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        let radius_squared = radius * radius;
        let mut results: Vec<(usize, f64)> = self
            .points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let distance_squared = (point - query).norm_squared();
                if distance_squared <= radius_squared {
                    Some((idx, distance_squared))
                } else {
                    None
                }
            })
            .collect();
        sort_deterministic(&mut results);
        results
    }
}
