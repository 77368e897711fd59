//! Splits crossing elements at their closest approach.
//!
//! Candidate pairs come from an element spatial hash. Pairs sharing an
//! endpoint and nearly parallel pairs are skipped; the collinear pass owns
//! the latter. Every accepted crossing puts one node at the midpoint of the
//! two closest points and a pending split on both elements. Splits are
//! applied only after the whole scan.

use std::collections::{BTreeMap, BTreeSet};

use ftk_model::FeModel;
use serde::Serialize;

use crate::error::Result;
use crate::geometry::{is_nearly_parallel, segment_intersection};
use crate::log::{LogFn, LogSink};
use crate::modify::chain;
use crate::spatial_hash::SpatialHash;

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionSplitOptions {
    /// Largest gap between the two closest points still counted as a crossing
    pub dist_tol: f64,
    pub param_tol: f64,
    pub grid_cell_size: f64,
    pub min_seg_len_tol: f64,
    /// Split points closer than this along an element collapse to the first
    pub merge_tol_along: f64,
    pub reuse_original_id_for_first: bool,
    /// Deduplicate crossing nodes by coordinate; otherwise always allocate
    pub create_node_using_add_or_get: bool,
    pub max_print: usize,
    pub debug: bool,
    pub dry_run: bool,
}

impl Default for IntersectionSplitOptions {
    fn default() -> Self {
        Self {
            dist_tol: 1.0,
            param_tol: 1e-9,
            grid_cell_size: 200.0,
            min_seg_len_tol: 1e-6,
            merge_tol_along: 0.05,
            reuse_original_id_for_first: true,
            create_node_using_add_or_get: true,
            max_print: 50,
            debug: false,
            dry_run: false,
        }
    }
}

impl IntersectionSplitOptions {
    #[must_use]
    pub fn with_dist_tol(mut self, tol: f64) -> Self {
        self.dist_tol = tol;
        self
    }

    #[must_use]
    pub fn with_grid_cell_size(mut self, size: f64) -> Self {
        self.grid_cell_size = size;
        self
    }

    #[must_use]
    pub fn with_merge_tol_along(mut self, tol: f64) -> Self {
        self.merge_tol_along = tol;
        self
    }

    #[must_use]
    pub fn with_reuse_original_id_for_first(mut self, reuse: bool) -> Self {
        self.reuse_original_id_for_first = reuse;
        self
    }

    #[must_use]
    pub fn with_create_node_using_add_or_get(mut self, dedup: bool) -> Self {
        self.create_node_using_add_or_get = dedup;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntersectionSplitReport {
    pub elements_scanned: usize,
    pub pairs_tested: usize,
    pub intersections_found: usize,
    pub nodes_created: usize,
    pub elements_need_split: usize,
    pub elements_split: usize,
    pub elements_removed: usize,
    pub elements_added: usize,
}

/// Pending split: crossing node and parameter along the element.
type Hit = (i32, f64);

pub fn run(
    model: &mut FeModel,
    opt: &IntersectionSplitOptions,
    log: LogFn<'_>,
) -> Result<IntersectionSplitReport> {
    let mut log = LogSink::new(log);
    let mut report = IntersectionSplitReport::default();

    let ids = model.elements.ids();
    let grid = SpatialHash::for_elements(model, opt.grid_cell_size, opt.dist_tol);
    let mut visited: BTreeSet<(i32, i32)> = BTreeSet::new();
    let mut splits: BTreeMap<i32, Vec<Hit>> = BTreeMap::new();
    let mut printed = 0;

    for &eid in &ids {
        report.elements_scanned += 1;
        let a = match model.segment(eid) {
            Ok(s) => s,
            Err(e) => {
                log.warn(&format!("  element {eid} skipped: {e}"));
                continue;
            }
        };

        for other in grid.query_id(eid) {
            if other == eid || !visited.insert((eid.min(other), eid.max(other))) {
                continue;
            }
            let Ok(b) = model.segment(other) else {
                continue;
            };
            report.pairs_tested += 1;

            let shares_end = a.start_id == b.start_id
                || a.start_id == b.end_id
                || a.end_id == b.start_id
                || a.end_id == b.end_id;
            if shares_end || is_nearly_parallel(&a.start, &a.end, &b.start, &b.end) {
                continue;
            }
            let Some(ca) = segment_intersection(&a.start, &a.end, &b.start, &b.end, opt.dist_tol, opt.param_tol)
            else {
                continue;
            };
            report.intersections_found += 1;

            let node = if opt.dry_run {
                0
            } else {
                let before = model.nodes.len();
                let nid = if opt.create_node_using_add_or_get {
                    model.nodes.add_or_get(ca.midpoint())
                } else {
                    model.nodes.allocate(ca.midpoint())
                };
                if model.nodes.len() > before {
                    report.nodes_created += 1;
                }
                nid
            };

            if opt.debug && printed < opt.max_print {
                printed += 1;
                let m = ca.midpoint();
                log.line(&format!(
                    "  {eid} x {other}: s={:.4}, t={:.4}, gap={:.4}, node {node} at ({:.3}, {:.3}, {:.3})",
                    ca.s, ca.t, ca.distance, m.x, m.y, m.z
                ));
            }
            splits.entry(eid).or_default().push((node, ca.s));
            splits.entry(other).or_default().push((node, ca.t));
        }
    }

    report.elements_need_split = splits.len();
    if opt.dry_run {
        log.line(&summary(&report, true));
        return Ok(report);
    }

    for (eid, hits) in splits {
        match split_element(model, eid, hits, opt) {
            Ok(Some(rebuilt)) => {
                if rebuilt.removed {
                    report.elements_removed += 1;
                } else {
                    report.elements_split += 1;
                    report.elements_added += rebuilt.added.len();
                    if !rebuilt.reused_id {
                        report.elements_removed += 1;
                    }
                }
            }
            Ok(None) => report.elements_removed += 1,
            Err(e) => log.warn(&format!("  element {eid} not split: {e}")),
        }
    }

    log.line(&summary(&report, false));
    Ok(report)
}

/// Rebuilds one element through its pending split nodes. `None` when the
/// element lost an endpoint node and was deleted instead.
fn split_element(
    model: &mut FeModel,
    eid: i32,
    mut hits: Vec<Hit>,
    opt: &IntersectionSplitOptions,
) -> Result<Option<chain::Rebuilt>> {
    let seg = match model.segment(eid) {
        Ok(s) => s,
        Err(_) => {
            model.elements.remove(eid)?;
            return Ok(None);
        }
    };
    let len = seg.length();

    hits.sort_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));
    let mut kept: Vec<Hit> = Vec::with_capacity(hits.len());
    for hit in hits {
        match kept.last() {
            Some(last) if (hit.1 - last.1).abs() * len <= opt.merge_tol_along => {}
            _ => kept.push(hit),
        }
    }

    let interior: Vec<i32> = kept.iter().map(|(nid, _)| *nid).collect();
    let nodes = chain::build_chain(seg.start_id, &interior, seg.end_id);
    chain::rebuild_element(
        model,
        eid,
        &nodes,
        opt.min_seg_len_tol,
        opt.reuse_original_id_for_first,
    )
    .map(Some)
}

fn summary(r: &IntersectionSplitReport, dry_run: bool) -> String {
    format!(
        "Intersection split{}: scanned={}, pairs={}, intersections={}, new nodes={}, need split={}, split={}, removed={}, added={}",
        if dry_run { " (dry run)" } else { "" },
        r.elements_scanned,
        r.pairs_tested,
        r.intersections_found,
        r.nodes_created,
        r.elements_need_split,
        r.elements_split,
        r.elements_removed,
        r.elements_added
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftk_model::{Element, Point3};

    fn cross() -> FeModel {
        let mut model = FeModel::new();
        for (id, (x, y)) in [(-10.0, 0.0), (10.0, 0.0), (0.0, -10.0), (0.0, 10.0)]
            .into_iter()
            .enumerate()
        {
            model.nodes.add_with_id(id as i32 + 1, Point3::new(x, y, 0.0));
        }
        model.elements.add_with_id(1, Element::line(1, 2, 1).unwrap());
        model.elements.add_with_id(2, Element::line(3, 4, 1).unwrap());
        model
    }

    #[test]
    fn crossing_pair_shares_new_node() {
        let mut model = cross();
        let mut sink = |_: &str| {};
        let report = run(&mut model, &IntersectionSplitOptions::default(), Some(&mut sink)).unwrap();

        assert_eq!(report.intersections_found, 1);
        assert_eq!(report.nodes_created, 1);
        assert_eq!(report.elements_split, 2);
        assert_eq!(model.elements.len(), 4);
        assert_eq!(model.nodes.get(5).unwrap(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(model.elements.get(1).unwrap().node_ids(), &[1, 5]);
        assert_eq!(model.elements.count_node_usage(5), 4);
    }

    #[test]
    fn without_reuse_originals_disappear() {
        let mut model = cross();
        let mut sink = |_: &str| {};
        let opt = IntersectionSplitOptions::default().with_reuse_original_id_for_first(false);
        let report = run(&mut model, &opt, Some(&mut sink)).unwrap();
        assert_eq!(report.elements_removed, 2);
        assert_eq!(report.elements_added, 4);
        assert!(!model.elements.contains(1) && !model.elements.contains(2));
    }

    #[test]
    fn elements_sharing_an_end_are_left_alone() {
        let mut model = FeModel::new();
        model.nodes.add_with_id(1, Point3::new(0.0, 0.0, 0.0));
        model.nodes.add_with_id(2, Point3::new(10.0, 0.0, 0.0));
        model.nodes.add_with_id(3, Point3::new(0.0, 10.0, 0.0));
        model.elements.add_with_id(1, Element::line(1, 2, 1).unwrap());
        model.elements.add_with_id(2, Element::line(1, 3, 1).unwrap());
        let mut sink = |_: &str| {};
        let report = run(&mut model, &IntersectionSplitOptions::default(), Some(&mut sink)).unwrap();
        assert_eq!(report.pairs_tested, 1);
        assert_eq!(report.intersections_found, 0);
        assert_eq!(model.elements.len(), 2);
    }

    #[test]
    fn skew_gap_beyond_tolerance_is_ignored() {
        let mut model = cross();
        model.nodes.set_position(3, Point3::new(0.0, -10.0, 2.0)).unwrap();
        model.nodes.set_position(4, Point3::new(0.0, 10.0, 2.0)).unwrap();
        let mut sink = |_: &str| {};
        let report = run(&mut model, &IntersectionSplitOptions::default(), Some(&mut sink)).unwrap();
        assert_eq!(report.intersections_found, 0);
    }

    #[test]
    fn dry_run_detects_only() {
        let mut model = cross();
        let mut sink = |_: &str| {};
        let opt = IntersectionSplitOptions::default().with_dry_run(true);
        let report = run(&mut model, &opt, Some(&mut sink)).unwrap();
        assert_eq!(report.intersections_found, 1);
        assert_eq!(report.elements_need_split, 2);
        assert_eq!(model.nodes.len(), 4);
        assert_eq!(model.elements.len(), 2);
    }
}
