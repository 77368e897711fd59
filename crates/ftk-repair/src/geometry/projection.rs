//! Point projection onto segments and lines.

use nalgebra::{Point3, Vector3};

use super::EPS;

/// Foot point, parameter along `a -> b`, and distance from the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub point: Point3<f64>,
    pub t: f64,
    pub distance: f64,
}

impl Projection {
    fn degenerate(p: &Point3<f64>, a: &Point3<f64>) -> Self {
        Self {
            point: *a,
            t: 0.0,
            distance: (p - a).norm(),
        }
    }
}

/// Closest point on the segment; `t` is clamped to `[0, 1]`.
pub fn onto_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Projection {
    project(p, a, b, true)
}

/// Closest point on the infinite line through `a` and `b`; `t` is unclamped.
pub fn onto_line(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Projection {
    project(p, a, b, false)
}

/// Unclamped parameter of `p` along `a -> b` (0 for a degenerate segment).
pub fn parameter(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < EPS {
        return 0.0;
    }
    (p - a).dot(&ab) / len2
}

/// Signed station of `p` along a unit axis through `origin`, with its foot point.
pub fn onto_axis(
    p: &Point3<f64>,
    origin: &Point3<f64>,
    unit: &Vector3<f64>,
) -> (f64, Point3<f64>) {
    let t = (p - origin).dot(unit);
    (t, origin + unit * t)
}

fn project(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, clamp: bool) -> Projection {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < EPS {
        return Projection::degenerate(p, a);
    }
    let mut t = (p - a).dot(&ab) / len2;
    if clamp {
        t = t.clamp(0.0, 1.0);
    }
    let point = a + ab * t;
    Projection {
        point,
        t,
        distance: (p - point).norm(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn segment_projection_clamps_line_does_not() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let p = Point3::new(15.0, 3.0, 0.0);

        let seg = onto_segment(&p, &a, &b);
        assert_eq!(seg.t, 1.0);
        assert_relative_eq!(seg.distance, (25.0f64 + 9.0).sqrt());

        let line = onto_line(&p, &a, &b);
        assert_relative_eq!(line.t, 1.5);
        assert_relative_eq!(line.distance, 3.0);
        assert_relative_eq!(parameter(&p, &a, &b), 1.5);
    }

    #[test]
    fn degenerate_segment_falls_back_to_start() {
        let a = Point3::new(1.0, 1.0, 1.0);
        let p = Point3::new(1.0, 1.0, 4.0);
        let proj = onto_line(&p, &a, &a);
        assert_eq!(proj.point, a);
        assert_eq!(proj.t, 0.0);
        assert_relative_eq!(proj.distance, 3.0);
        assert_eq!(parameter(&p, &a, &a), 0.0);
    }

    #[test]
    fn axis_station_is_signed() {
        let (t, foot) = onto_axis(
            &Point3::new(-2.0, 5.0, 0.0),
            &Point3::origin(),
            &Vector3::x(),
        );
        assert_relative_eq!(t, -2.0);
        assert_eq!(foot, Point3::new(-2.0, 0.0, 0.0));
    }
}
