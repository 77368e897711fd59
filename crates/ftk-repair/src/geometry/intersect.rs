//! Closest approach between segments and rays.

use nalgebra::{Point3, Vector3};

/// Denominator threshold of the closest-point solve.
const SOLVE_EPS: f64 = 1e-18;

/// Below this `|sin θ|` two segments are left to the collinear pass.
pub const NEARLY_PARALLEL_SIN: f64 = 1e-4;

/// Closest points between segment `P0P1` (parameter `s`) and `Q0Q1` (parameter `t`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub s: f64,
    pub t: f64,
    pub on_first: Point3<f64>,
    pub on_second: Point3<f64>,
    pub distance: f64,
}

impl ClosestApproach {
    pub fn midpoint(&self) -> Point3<f64> {
        nalgebra::center(&self.on_first, &self.on_second)
    }
}

/// Clamped closest points between two segments.
///
/// Near-parallel inputs start from `s = 0` before clamping. Both parameters
/// end in `[0, 1]`.
pub fn closest_points_between_segments(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    q0: &Point3<f64>,
    q1: &Point3<f64>,
) -> ClosestApproach {
    let u = p1 - p0;
    let v = q1 - q0;
    let w = p0 - q0;

    let a = u.dot(&u);
    let b = u.dot(&v);
    let c = v.dot(&v);
    let d = u.dot(&w);
    let e = v.dot(&w);

    let denom = a * c - b * b;
    let (mut s_n, mut s_d, mut t_n, t_d) = if denom < SOLVE_EPS {
        (0.0, 1.0, e, c)
    } else {
        let s_n = b * e - c * d;
        let t_n = a * e - b * d;
        if s_n < 0.0 {
            (0.0, denom, e, c)
        } else if s_n > denom {
            (denom, denom, e + b, c)
        } else {
            (s_n, denom, t_n, denom)
        }
    };

    if t_n < 0.0 {
        t_n = 0.0;
        if -d < 0.0 {
            s_n = 0.0;
        } else if -d > a {
            s_n = s_d;
        } else {
            s_n = -d;
            s_d = a;
        }
    } else if t_n > t_d {
        t_n = t_d;
        if -d + b < 0.0 {
            s_n = 0.0;
        } else if -d + b > a {
            s_n = s_d;
        } else {
            s_n = -d + b;
            s_d = a;
        }
    }

    let s = if s_n.abs() < SOLVE_EPS { 0.0 } else { s_n / s_d };
    let t = if t_n.abs() < SOLVE_EPS { 0.0 } else { t_n / t_d };
    let on_first = p0 + u * s;
    let on_second = q0 + v * t;

    ClosestApproach {
        s,
        t,
        on_first,
        on_second,
        distance: (on_first - on_second).norm(),
    }
}

/// Closest approach when it lies inside both segments (within `param_tol`)
/// and the gap is at most `dist_tol`.
pub fn segment_intersection(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    q0: &Point3<f64>,
    q1: &Point3<f64>,
    dist_tol: f64,
    param_tol: f64,
) -> Option<ClosestApproach> {
    let ca = closest_points_between_segments(p0, p1, q0, q1);
    let inside = |x: f64| x >= -param_tol && x <= 1.0 + param_tol;
    (inside(ca.s) && inside(ca.t) && ca.distance <= dist_tol).then_some(ca)
}

/// `|a × b| / (|a||b|) < 1e-4`. Degenerate segments are not parallel.
pub fn is_nearly_parallel(
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
) -> bool {
    super::sin_angle(&(a1 - a0), &(b1 - b0)).is_some_and(|sin| sin < NEARLY_PARALLEL_SIN)
}

/// Hit of a ray against a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Point on the segment
    pub point: Point3<f64>,
    /// Distance travelled along the ray
    pub distance: f64,
}

/// Casts a unit-direction ray of length `max_dist` against segment `s0s1`.
///
/// The ray must pass within `tol` of the segment. The reported point is
/// always on the segment, clamped to its nearer end when the ray passes
/// just beyond it.
pub fn ray_segment_hit(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    max_dist: f64,
    s0: &Point3<f64>,
    s1: &Point3<f64>,
    tol: f64,
) -> Option<RayHit> {
    let seg = s1 - s0;
    let seg_len = seg.norm();
    if seg_len < super::EPS {
        return None;
    }
    let seg_unit = seg / seg_len;
    let w0 = origin - s0;

    let b = dir.dot(&seg_unit);
    let d = dir.dot(&w0);
    let e = seg_unit.dot(&w0);
    let denom = 1.0 - b * b;
    if denom < super::EPS {
        return None;
    }

    let t = (b * e - d) / denom;
    let u = (e - b * d) / denom;
    if !(0.0..=max_dist).contains(&t) || u < -tol || u > seg_len + tol {
        return None;
    }

    // a hit just past an end lands on that end
    let on_ray = origin + dir * t;
    let on_seg = s0 + seg_unit * u.clamp(0.0, seg_len);
    ((on_ray - on_seg).norm() <= tol).then_some(RayHit {
        point: on_seg,
        distance: t,
    })
}
