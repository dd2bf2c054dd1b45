//! Intersection and proximity predicates over raw 3D points

use pivotmesh_core::Point3d;

/// Check whether four points lie in a common plane
///
/// Uses the scalar triple product of the three vectors spanned from
/// `p0`; the test is absolute, so it is meant for inputs of roughly
/// unit scale.
pub fn points_coplanar(p0: &Point3d, p1: &Point3d, p2: &Point3d, p3: &Point3d) -> bool {
    let volume = (p1 - p0).dot(&(p2 - p0).cross(&(p3 - p0)));
    volume.abs() < 1e-12
}

/// Minimum distance between the segments [p1, q1] and [p2, q2]
///
/// Clamped closest-point parametrisation; handles segments degenerated
/// to points.
pub fn segments_min_distance(p1: &Point3d, q1: &Point3d, p2: &Point3d, q2: &Point3d) -> f64 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= 1e-16 && e <= 1e-16 {
        (0.0, 0.0)
    } else if a <= 1e-16 {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= 1e-16 {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            // For parallel segments any point on the first segment works
            let mut s = if denom > 1e-16 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let closest1 = p1 + d1 * s;
    let closest2 = p2 + d2 * t;
    (closest1 - closest2).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coplanar_points() {
        let p0 = Point3d::new(0.0, 0.0, 0.0);
        let p1 = Point3d::new(1.0, 0.0, 0.0);
        let p2 = Point3d::new(0.0, 1.0, 0.0);
        let p3 = Point3d::new(3.0, -2.0, 0.0);
        assert!(points_coplanar(&p0, &p1, &p2, &p3));
    }

    #[test]
    fn test_non_coplanar_points() {
        let p0 = Point3d::new(0.0, 0.0, 0.0);
        let p1 = Point3d::new(1.0, 0.0, 0.0);
        let p2 = Point3d::new(0.0, 1.0, 0.0);
        let p3 = Point3d::new(0.0, 0.0, 1.0);
        assert!(!points_coplanar(&p0, &p1, &p2, &p3));
    }

    #[test]
    fn test_crossing_segments_distance_zero() {
        let d = segments_min_distance(
            &Point3d::new(-1.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, -1.0, 0.0),
            &Point3d::new(0.0, 1.0, 0.0),
        );
        assert!(d < 1e-12);
    }

    #[test]
    fn test_parallel_segments_distance() {
        let d = segments_min_distance(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, 1.0, 0.0),
            &Point3d::new(1.0, 1.0, 0.0),
        );
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_skew_segments_distance() {
        let d = segments_min_distance(
            &Point3d::new(-1.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, -1.0, 2.0),
            &Point3d::new(0.0, 1.0, 2.0),
        );
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_collinear_segments() {
        let d = segments_min_distance(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(3.0, 0.0, 0.0),
            &Point3d::new(4.0, 0.0, 0.0),
        );
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_segment_is_point() {
        let d = segments_min_distance(
            &Point3d::new(0.0, 0.0, 3.0),
            &Point3d::new(0.0, 0.0, 3.0),
            &Point3d::new(-1.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-12);
    }
}
