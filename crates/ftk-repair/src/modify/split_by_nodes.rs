//! Splits elements at existing nodes lying on them.

use std::collections::BTreeSet;

use ftk_model::FeModel;
use serde::Serialize;

use crate::error::Result;
use crate::geometry::{Aabb, EPS, projection};
use crate::log::{LogFn, LogSink};
use crate::modify::chain;
use crate::spatial_hash::SpatialHash;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitByNodesOptions {
    /// Largest distance from the element's line for a node to count as on it
    pub distance_tol: f64,
    pub param_tol: f64,
    pub merge_tol_along: f64,
    pub min_seg_len_tol: f64,
    pub grid_cell_size: f64,
    /// Move accepted nodes exactly onto the line before splitting
    pub snap_node_to_line: bool,
    pub reuse_original_id_for_first: bool,
    pub debug: bool,
    pub dry_run: bool,
}

impl Default for SplitByNodesOptions {
    fn default() -> Self {
        Self {
            distance_tol: 0.5,
            param_tol: 1e-9,
            merge_tol_along: 0.05,
            min_seg_len_tol: 1e-6,
            grid_cell_size: 5.0,
            snap_node_to_line: false,
            reuse_original_id_for_first: true,
            debug: false,
            dry_run: false,
        }
    }
}

impl SplitByNodesOptions {
    #[must_use]
    pub fn with_distance_tol(mut self, tol: f64) -> Self {
        self.distance_tol = tol;
        self
    }

    #[must_use]
    pub fn with_grid_cell_size(mut self, size: f64) -> Self {
        self.grid_cell_size = size;
        self
    }

    #[must_use]
    pub fn with_snap_node_to_line(mut self, snap: bool) -> Self {
        self.snap_node_to_line = snap;
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
pub struct SplitByNodesReport {
    pub elements_scanned: usize,
    pub elements_with_hits: usize,
    pub nodes_inserted: usize,
    pub nodes_snapped: usize,
    pub elements_split: usize,
    pub segments_created: usize,
    /// Other elements on a snapped node that collapsed below the minimum length
    pub elements_removed: usize,
}

#[derive(Debug, Clone, Copy)]
struct OnLine {
    node: i32,
    /// Arc length from the start node
    along: f64,
    offset: f64,
    foot: ftk_model::Point3<f64>,
}

pub fn run(
    model: &mut FeModel,
    opt: &SplitByNodesOptions,
    log: LogFn<'_>,
) -> Result<SplitByNodesReport> {
    let mut log = LogSink::new(log);
    let mut report = SplitByNodesReport::default();

    let ids = model.elements.ids();
    let grid = SpatialHash::for_nodes(model, opt.grid_cell_size);

    for eid in ids {
        if !model.elements.contains(eid) {
            continue;
        }
        report.elements_scanned += 1;
        let seg = match model.segment(eid) {
            Ok(s) => s,
            Err(e) => {
                log.warn(&format!("  element {eid} skipped: {e}"));
                continue;
            }
        };
        let len = seg.length();
        if len < EPS {
            continue;
        }

        let mut hits = Vec::new();
        let search = Aabb::from_segment(&seg.start, &seg.end, opt.distance_tol);
        for nid in grid.query(&search) {
            if nid == seg.start_id || nid == seg.end_id {
                continue;
            }
            let Ok(p) = model.nodes.get(nid) else {
                continue;
            };
            let proj = projection::onto_line(&p, &seg.start, &seg.end);
            let inside = proj.t > opt.param_tol && proj.t < 1.0 - opt.param_tol;
            if inside && proj.distance <= opt.distance_tol {
                hits.push(OnLine {
                    node: nid,
                    along: proj.t * len,
                    offset: proj.distance,
                    foot: proj.point,
                });
            }
        }
        if hits.is_empty() {
            continue;
        }

        hits.sort_by(|a, b| a.along.total_cmp(&b.along).then(a.node.cmp(&b.node)));
        let mut kept: Vec<OnLine> = Vec::with_capacity(hits.len());
        for hit in hits {
            match kept.last_mut() {
                Some(last) if hit.along - last.along <= opt.merge_tol_along => {
                    if hit.offset < last.offset {
                        *last = hit;
                    }
                }
                _ => kept.push(hit),
            }
        }

        report.elements_with_hits += 1;
        report.nodes_inserted += kept.len();
        if opt.debug {
            let list: Vec<String> = kept.iter().map(|h| h.node.to_string()).collect();
            log.line(&format!("  element {eid}: nodes [{}]", list.join(", ")));
        }
        if opt.dry_run {
            continue;
        }

        if opt.snap_node_to_line {
            let mut moved = BTreeSet::new();
            for hit in &kept {
                model.nodes.set_position(hit.node, hit.foot)?;
                report.nodes_snapped += 1;
                moved.insert(hit.node);
            }
            let skip = BTreeSet::from([eid]);
            let collapsed = chain::remove_collapsed(model, &moved, &skip, opt.min_seg_len_tol)?;
            report.elements_removed += collapsed.len();
        }

        let interior: Vec<i32> = kept.iter().map(|h| h.node).collect();
        let nodes = chain::build_chain(seg.start_id, &interior, seg.end_id);
        match chain::rebuild_element(
            model,
            eid,
            &nodes,
            opt.min_seg_len_tol,
            opt.reuse_original_id_for_first,
        ) {
            Ok(rebuilt) => {
                report.elements_split += 1;
                report.segments_created += rebuilt.segments;
            }
            Err(e) => log.warn(&format!("  element {eid} not split: {e}")),
        }
    }

    log.line(&format!(
        "Split by nodes{}: scanned={}, with hits={}, nodes={}, snapped={}, split={}, segments={}, removed={}",
        if opt.dry_run { " (dry run)" } else { "" },
        report.elements_scanned,
        report.elements_with_hits,
        report.nodes_inserted,
        report.nodes_snapped,
        report.elements_split,
        report.segments_created,
        report.elements_removed
    ));
    Ok(report)
}
