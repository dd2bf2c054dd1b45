//! Integration tests for pivotmesh-reconstruction
//!
//! End-to-end ball-pivoting scenarios: canonical shapes, boundary
//! cases, multi-radius recovery and determinism.

use pivotmesh_core::{Error, Point3d, PointCloud, Vector3d};
use pivotmesh_reconstruction::ball_pivoting_reconstruction;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;

/// Flat grid of cols x rows points at integer coordinates, normals up
fn grid_cloud(cols: usize, rows: usize) -> PointCloud {
    let mut points = Vec::new();
    for i in 0..cols {
        for j in 0..rows {
            points.push(Point3d::new(i as f64, j as f64, 0.0));
        }
    }
    let normals = vec![Vector3d::new(0.0, 0.0, 1.0); points.len()];
    PointCloud::from_points_and_normals(points, normals).unwrap()
}

/// Unit tetrahedron with outward vertex normals
fn tetrahedron_cloud() -> PointCloud {
    let points = vec![
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(0.0, 1.0, 0.0),
        Point3d::new(0.0, 0.0, 1.0),
    ];
    let centroid = Point3d::new(0.25, 0.25, 0.25);
    let normals = points.iter().map(|p| (p - centroid).normalize()).collect();
    PointCloud::from_points_and_normals(points, normals).unwrap()
}

fn sorted_triple(face: [usize; 3]) -> [usize; 3] {
    let mut t = face;
    t.sort_unstable();
    t
}

/// Normal implied by the emitted winding of a face
fn winding_normal(cloud: &PointCloud, face: [usize; 3]) -> Vector3d {
    let v0 = cloud.points[face[0]];
    let v1 = cloud.points[face[1]];
    let v2 = cloud.points[face[2]];
    (v1 - v0).cross(&(v2 - v0)).normalize()
}

#[test]
fn test_single_triangle() {
    let cloud = PointCloud::from_points_and_normals(
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ],
        vec![Vector3d::new(0.0, 0.0, 1.0); 3],
    )
    .unwrap();

    // the circumradius of this triangle is ~0.707, so a slightly larger
    // ball rests on all three points
    let mesh = ball_pivoting_reconstruction(&cloud, &[0.75]).unwrap();

    assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    let face_normals = mesh.face_normals.as_ref().unwrap();
    assert_eq!(face_normals.len(), 1);
    assert!((face_normals[0] - Vector3d::new(0.0, 0.0, 1.0)).norm() < 1e-12);
    assert_eq!(mesh.vertices, cloud.points);
}

#[test]
fn test_unit_tetrahedron() {
    let cloud = tetrahedron_cloud();
    let mesh = ball_pivoting_reconstruction(&cloud, &[0.9]).unwrap();

    assert_eq!(mesh.face_count(), 4);

    // all four hull faces appear exactly once
    let mut triples: Vec<[usize; 3]> = mesh.faces.iter().map(|&f| sorted_triple(f)).collect();
    triples.sort_unstable();
    assert_eq!(triples, vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]);

    // every face winds outward
    let centroid = Point3d::new(0.25, 0.25, 0.25);
    for &face in &mesh.faces {
        let face_centroid = Point3d::from(
            (cloud.points[face[0]].coords
                + cloud.points[face[1]].coords
                + cloud.points[face[2]].coords)
                / 3.0,
        );
        let outward = face_centroid - centroid;
        assert!(winding_normal(&cloud, face).dot(&outward) > 0.0);
    }
}

#[test]
fn test_tetrahedron_is_closed_and_manifold() {
    let cloud = tetrahedron_cloud();
    let mesh = ball_pivoting_reconstruction(&cloud, &[0.9]).unwrap();

    // every directed edge appears exactly once, so each undirected edge
    // is shared by two consistently wound faces
    let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
    for &[a, b, c] in &mesh.faces {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *directed.entry((u, v)).or_insert(0) += 1;
        }
    }
    for (&(u, v), &count) in &directed {
        assert_eq!(count, 1);
        assert_eq!(directed.get(&(v, u)), Some(&1));
    }
}

#[test]
fn test_flat_grid_tessellation() {
    let cloud = grid_cloud(3, 3);
    let mesh = ball_pivoting_reconstruction(&cloud, &[0.8]).unwrap();

    // 2 triangles per grid cell
    assert_eq!(mesh.face_count(), 8);

    let mut triples: Vec<[usize; 3]> = mesh.faces.iter().map(|&f| sorted_triple(f)).collect();
    triples.sort_unstable();
    triples.dedup();
    assert_eq!(triples.len(), 8);

    // emitted winding agrees with the supplied normals everywhere
    for &face in &mesh.faces {
        let normal = winding_normal(&cloud, face);
        assert!((normal - Vector3d::new(0.0, 0.0, 1.0)).norm() < 1e-9);
    }
}

#[test]
fn test_two_radius_gap_recovery() {
    // an equilateral patch and one far point: the triangle bridging the
    // gap has circumradius ~0.76, reachable by the second radius only
    let points = vec![
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(0.5, 0.866, 0.0),
        Point3d::new(2.0, 0.7, 0.0),
    ];
    let normals = vec![Vector3d::new(0.0, 0.0, 1.0); points.len()];
    let cloud = PointCloud::from_points_and_normals(points, normals).unwrap();

    let small = ball_pivoting_reconstruction(&cloud, &[0.7]).unwrap();
    assert_eq!(small.faces, vec![[0, 1, 2]]);

    let both = ball_pivoting_reconstruction(&cloud, &[0.7, 1.0]).unwrap();
    assert_eq!(both.face_count(), 2);
    assert_eq!(sorted_triple(both.faces[0]), [0, 1, 2]);
    assert_eq!(sorted_triple(both.faces[1]), [1, 2, 3]);
}

#[test]
fn test_radius_zero_is_rejected() {
    let cloud = grid_cloud(2, 2);
    let result = ball_pivoting_reconstruction(&cloud, &[0.0]);
    assert!(matches!(result, Err(Error::InvalidRadius(r)) if r == 0.0));
}

#[test]
fn test_negative_radius_is_rejected() {
    let cloud = grid_cloud(2, 2);
    let result = ball_pivoting_reconstruction(&cloud, &[0.8, -1.0]);
    assert!(matches!(result, Err(Error::InvalidRadius(r)) if r == -1.0));
}

#[test]
fn test_missing_normals_is_rejected() {
    let cloud = PointCloud::from_points(vec![
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(0.0, 1.0, 0.0),
    ]);
    let result = ball_pivoting_reconstruction(&cloud, &[0.8]);
    assert!(matches!(result, Err(Error::MissingNormals)));
}

#[test]
fn test_fewer_than_three_points_gives_empty_mesh() {
    let cloud = PointCloud::from_points_and_normals(
        vec![Point3d::new(0.0, 0.0, 0.0), Point3d::new(1.0, 0.0, 0.0)],
        vec![Vector3d::new(0.0, 0.0, 1.0); 2],
    )
    .unwrap();
    let mesh = ball_pivoting_reconstruction(&cloud, &[0.8]).unwrap();
    assert_eq!(mesh.face_count(), 0);
    assert_eq!(mesh.vertex_count(), 2);
}

#[test]
fn test_radius_below_point_spacing_gives_empty_mesh() {
    let cloud = grid_cloud(3, 3);
    let mesh = ball_pivoting_reconstruction(&cloud, &[0.3]).unwrap();
    assert_eq!(mesh.face_count(), 0);
}

#[test]
fn test_attributes_carried_to_mesh() {
    let mut cloud = grid_cloud(3, 3);
    let colors: Vec<[u8; 3]> = (0..cloud.len()).map(|i| [i as u8, 0, 255]).collect();
    cloud.set_colors(colors.clone()).unwrap();

    let mesh = ball_pivoting_reconstruction(&cloud, &[0.8]).unwrap();
    assert_eq!(mesh.vertices, cloud.points);
    assert_eq!(mesh.normals.as_deref(), cloud.normals.as_deref());
    assert_eq!(mesh.colors.as_deref(), Some(colors.as_slice()));
    assert_eq!(
        mesh.face_normals.as_ref().map(|n| n.len()),
        Some(mesh.face_count())
    );
}

#[test]
fn test_reconstruction_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut points = Vec::new();
    for i in 0..5 {
        for j in 0..5 {
            points.push(Point3d::new(
                i as f64 + rng.gen_range(-0.2..0.2),
                j as f64 + rng.gen_range(-0.2..0.2),
                rng.gen_range(-0.05..0.05),
            ));
        }
    }
    let normals = vec![Vector3d::new(0.0, 0.0, 1.0); points.len()];
    let cloud = PointCloud::from_points_and_normals(points, normals).unwrap();

    let radii = [0.9, 1.4];
    let first = ball_pivoting_reconstruction(&cloud, &radii).unwrap();
    let second = ball_pivoting_reconstruction(&cloud, &radii).unwrap();

    assert_eq!(first.faces, second.faces);
    assert_eq!(
        first.face_normals.as_deref(),
        second.face_normals.as_deref()
    );
    assert!(!first.faces.is_empty());
}
