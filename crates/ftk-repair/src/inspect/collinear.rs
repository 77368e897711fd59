//! Groups of elements lying on a common infinite line.

use ftk_model::{FeModel, Segment};
use rayon::prelude::*;

use crate::geometry::{is_parallel, projection};
use crate::union_find::UnionFind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollinearOptions {
    /// Maximum angle between element directions, radians
    pub angle_tol_rad: f64,
    /// Maximum absolute offset between the lines
    pub distance_tol: f64,
}

impl Default for CollinearOptions {
    fn default() -> Self {
        Self {
            angle_tol_rad: 3e-2,
            distance_tol: 20.0,
        }
    }
}

impl CollinearOptions {
    #[must_use]
    pub fn with_angle_tol(mut self, rad: f64) -> Self {
        self.angle_tol_rad = rad;
        self
    }

    #[must_use]
    pub fn with_distance_tol(mut self, tol: f64) -> Self {
        self.distance_tol = tol;
        self
    }
}

/// Whether `b` lies on `a`'s infinite line within the tolerances.
pub fn are_collinear(a: &Segment, b: &Segment, opt: &CollinearOptions) -> bool {
    is_parallel(&a.vector(), &b.vector(), opt.angle_tol_rad)
        && projection::onto_line(&b.start, &a.start, &a.end).distance < opt.distance_tol
}

/// Collinear groups with two or more members, each sorted ascending.
///
/// Every element pair is tested. The scan runs in parallel but pairs are
/// collected in index order, so the result does not depend on scheduling.
pub fn find_collinear_groups(model: &FeModel, opt: &CollinearOptions) -> Vec<Vec<i32>> {
    let segments: Vec<Segment> = model
        .elements
        .ids()
        .into_iter()
        .filter_map(|eid| model.segment(eid).ok())
        .collect();
    if segments.len() < 2 {
        return Vec::new();
    }

    let pairs: Vec<(i32, i32)> = (0..segments.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = &segments[i];
            segments[i + 1..]
                .iter()
                .filter(move |b| are_collinear(a, b, opt))
                .map(move |b| (a.element_id, b.element_id))
        })
        .collect();

    let mut uf = UnionFind::with_ids(segments.iter().map(|s| s.element_id));
    for (a, b) in pairs {
        uf.union(a, b);
    }
    uf.clusters_of_size(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftk_model::{Element, Point3};

    fn model_with(lines: &[((f64, f64, f64), (f64, f64, f64))]) -> FeModel {
        let mut model = FeModel::new();
        for &(a, b) in lines {
            let n1 = model.nodes.add_or_get(Point3::new(a.0, a.1, a.2));
            let n2 = model.nodes.add_or_get(Point3::new(b.0, b.1, b.2));
            model.elements.add_new(Element::line(n1, n2, 1).unwrap());
        }
        model
    }

    #[test]
    fn groups_offset_parallel_lines_within_tolerance() {
        let model = model_with(&[
            ((0.0, 0.0, 0.0), (100.0, 0.0, 0.0)),
            ((50.0, 5.0, 0.0), (200.0, 5.0, 0.0)),
            ((0.0, 100.0, 0.0), (100.0, 100.0, 0.0)),
            ((0.0, 0.0, 0.0), (0.0, 100.0, 0.0)),
        ]);
        let groups = find_collinear_groups(&model, &CollinearOptions::default());
        assert_eq!(groups, vec![vec![1, 2]]);

        let strict = CollinearOptions::default().with_distance_tol(1.0);
        assert!(find_collinear_groups(&model, &strict).is_empty());
    }

    #[test]
    fn reversed_direction_is_still_collinear() {
        let model = model_with(&[
            ((0.0, 0.0, 0.0), (100.0, 0.0, 0.0)),
            ((300.0, 0.0, 0.0), (150.0, 0.0, 0.0)),
        ]);
        assert_eq!(
            find_collinear_groups(&model, &CollinearOptions::default()),
            vec![vec![1, 2]]
        );
    }
}
