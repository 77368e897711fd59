//! Reference, length and node-equivalence checks.
//!
//! These only report. Callers decide whether to repair.

use ftk_model::{FeModel, IntegrityIssue};

use crate::geometry::Aabb;
use crate::spatial_hash::SpatialHash;
use crate::union_find::UnionFind;

/// Elements pointing at missing nodes or properties, and properties pointing
/// at missing materials.
pub fn find_invalid_references(model: &FeModel) -> Vec<IntegrityIssue> {
    model.validate()
}

/// Elements shorter than `threshold`, with their length.
pub fn find_short_elements(model: &FeModel, threshold: f64) -> Vec<(i32, f64)> {
    model
        .elements
        .ids()
        .into_iter()
        .filter_map(|eid| {
            let len = model.element_length(eid).ok()?;
            (len < threshold).then_some((eid, len))
        })
        .collect()
}

/// Groups of distinct nodes closer than `tol` to each other (transitively).
pub fn find_coincident_nodes(model: &FeModel, tol: f64) -> Vec<Vec<i32>> {
    let tol = tol.max(0.0);
    let grid = SpatialHash::for_nodes(model, (tol * 4.0).max(1.0));
    let mut uf = UnionFind::new();
    for (id, p) in model.nodes.iter() {
        for other in grid.query(&Aabb::from_point(p, tol)) {
            if other <= id {
                continue;
            }
            if let Ok(q) = model.nodes.get(other)
                && (q - p).norm() <= tol
            {
                uf.union(id, other);
            }
        }
    }
    uf.clusters_of_size(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftk_model::{Element, Point3};

    #[test]
    fn finds_short_elements_and_coincident_nodes() {
        let mut model = FeModel::new();
        model.nodes.add_with_id(1, Point3::new(0.0, 0.0, 0.0));
        model.nodes.add_with_id(2, Point3::new(0.5, 0.0, 0.0));
        model.nodes.add_with_id(3, Point3::new(100.0, 0.0, 0.0));
        model.nodes.add_with_id(4, Point3::new(100.02, 0.0, 0.0));
        model.nodes.add_with_id(5, Point3::new(100.04, 0.0, 0.0));
        model.elements.add_new(Element::line(1, 2, 1).unwrap());
        model.elements.add_new(Element::line(2, 3, 1).unwrap());

        let short = find_short_elements(&model, 1.0);
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].0, 1);

        assert_eq!(find_coincident_nodes(&model, 0.03), vec![vec![3, 4, 5]]);
        assert!(find_coincident_nodes(&model, 0.001).is_empty());
    }

    #[test]
    fn invalid_references_are_listed() {
        let mut model = FeModel::new();
        model.nodes.add_with_id(1, Point3::origin());
        model.elements.add_new(Element::line(1, 2, 7).unwrap());
        assert_eq!(find_invalid_references(&model).len(), 2);
        assert_eq!(model.elements.len(), 1);
    }
}
