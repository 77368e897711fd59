//! Overlapping members inside collinear groups.
//!
//! The overlap threshold is relative to the model: 2‰ of the node bounding
//! box diagonal. The collinearity offset tolerance stays absolute.

use ftk_model::{FeModel, Segment};

use crate::geometry::projection;
use crate::inspect::collinear::{CollinearOptions, find_collinear_groups};
use crate::union_find::UnionFind;

/// Fraction of the model size two members must share to overlap.
pub const OVERLAP_RATIO: f64 = 2e-3;

pub fn overlap_tolerance(model: &FeModel) -> f64 {
    OVERLAP_RATIO * model.nodes.model_size()
}

/// Length of `b`'s interval projected onto `a` that lies within `a`.
pub fn overlap_length(a: &Segment, b: &Segment) -> f64 {
    let ta = projection::parameter(&b.start, &a.start, &a.end);
    let tb = projection::parameter(&b.end, &a.start, &a.end);
    let lo = ta.min(tb).max(0.0);
    let hi = ta.max(tb).min(1.0);
    (hi - lo) * a.length()
}

/// Member pairs of each group whose shared length exceeds `tol`.
pub fn find_overlaps_with_tol(model: &FeModel, groups: &[Vec<i32>], tol: f64) -> Vec<(i32, i32)> {
    let mut pairs = Vec::new();
    for group in groups.iter().filter(|g| g.len() >= 2) {
        let segments: Vec<Segment> = group
            .iter()
            .filter_map(|&eid| model.segment(eid).ok())
            .collect();
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if overlap_length(a, b) > tol {
                    pairs.push((a.element_id, b.element_id));
                }
            }
        }
    }
    pairs
}

pub fn find_overlaps(model: &FeModel, groups: &[Vec<i32>]) -> Vec<(i32, i32)> {
    find_overlaps_with_tol(model, groups, overlap_tolerance(model))
}

/// Collinear groups refined to members that actually overlap, merged
/// transitively. Only groups of two or more are returned.
pub fn find_overlap_groups(model: &FeModel, opt: &CollinearOptions) -> Vec<Vec<i32>> {
    let collinear = find_collinear_groups(model, opt);
    let overlaps = find_overlaps(model, &collinear);
    if overlaps.is_empty() {
        return Vec::new();
    }
    let mut uf = UnionFind::new();
    for (a, b) in overlaps {
        uf.union(a, b);
    }
    uf.clusters_of_size(2)
}
