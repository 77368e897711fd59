//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Box around a segment, grown by `pad` on every side.
    pub fn from_segment(a: &Point3<f64>, b: &Point3<f64>, pad: f64) -> Self {
        Self::new(*a, *b).inflated(pad)
    }

    pub fn from_point(p: &Point3<f64>, pad: f64) -> Self {
        Self::new(*p, *p).inflated(pad)
    }

    pub fn inflated(&self, pad: f64) -> Self {
        let pad = Vector3::repeat(pad.max(0.0));
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    pub fn expand_to_include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_box_orders_corners_and_pads() {
        let bb = Aabb::from_segment(&Point3::new(5.0, 0.0, 2.0), &Point3::new(1.0, 3.0, 2.0), 0.5);
        assert_eq!(bb.min, Point3::new(0.5, -0.5, 1.5));
        assert_eq!(bb.max, Point3::new(5.5, 3.5, 2.5));
        assert!(bb.contains(&Point3::new(3.0, 1.0, 2.0)));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Point3::new(1.1, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn expand_grows_box() {
        let mut bb = Aabb::from_point(&Point3::origin(), 0.0);
        bb.expand_to_include(&Point3::new(3.0, 4.0, 0.0));
        assert_eq!(bb.diagonal(), 5.0);
    }
}
