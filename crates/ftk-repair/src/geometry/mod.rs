//! Vector helpers, projections, boxes and segment intersection.

pub mod bbox;
pub mod intersect;
pub mod projection;

use nalgebra::{Point3, Vector3};

pub use bbox::Aabb;
pub use intersect::{
    ClosestApproach, RayHit, closest_points_between_segments, is_nearly_parallel, ray_segment_hit,
    segment_intersection,
};
pub use projection::Projection;

/// Length below which a vector counts as degenerate.
pub const EPS: f64 = 1e-9;

/// Unit vector from `a` to `b`, or `None` for coincident points.
pub fn unit_direction(a: &Point3<f64>, b: &Point3<f64>) -> Option<Vector3<f64>> {
    let v = b - a;
    let len = v.norm();
    (len >= EPS).then(|| v / len)
}

/// `|cos θ| >= cos(angle_tol)`; zero-length vectors are never parallel.
pub fn is_parallel(u: &Vector3<f64>, v: &Vector3<f64>, angle_tol: f64) -> bool {
    let (lu, lv) = (u.norm(), v.norm());
    if lu < EPS || lv < EPS {
        return false;
    }
    let cos = (u.dot(v) / (lu * lv)).abs().min(1.0);
    cos >= angle_tol.cos()
}

/// `|sin θ|` between two vectors, `None` if either is degenerate.
pub fn sin_angle(u: &Vector3<f64>, v: &Vector3<f64>) -> Option<f64> {
    let (lu, lv) = (u.norm(), v.norm());
    if lu < 1e-18 || lv < 1e-18 {
        return None;
    }
    Some(u.cross(v).norm() / (lu * lv))
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}
