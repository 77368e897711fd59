//! Small repairs run between stages: short-element collapse, dangling
//! stub removal, zero-length removal and orphan-node sweeping.

use std::collections::BTreeSet;

use ftk_model::FeModel;
use serde::Serialize;

use crate::error::Result;
use crate::inspect::node_degree;
use crate::log::{LogFn, LogSink};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub elements_removed: usize,
    pub elements_rewired: usize,
    pub nodes_removed: usize,
}

impl CleanupReport {
    pub fn absorb(&mut self, other: CleanupReport) {
        self.elements_removed += other.elements_removed;
        self.elements_rewired += other.elements_rewired;
        self.nodes_removed += other.nodes_removed;
    }
}

/// Collapses every element shorter than `tol` onto its start node.
///
/// Elements using the end node are rewired to the start node; any that would
/// then repeat a node are deleted. The end node is removed once unused.
pub fn collapse_short_elements(model: &mut FeModel, tol: f64, log: LogFn<'_>) -> Result<CleanupReport> {
    let mut log = LogSink::new(log);
    let mut report = CleanupReport::default();

    for eid in model.elements.ids() {
        if !model.elements.contains(eid) {
            continue;
        }
        let Ok(seg) = model.segment(eid) else {
            continue;
        };
        if seg.length() >= tol {
            continue;
        }
        let (keep, drop) = (seg.start_id, seg.end_id);
        model.elements.remove(eid)?;
        report.elements_removed += 1;

        for nb in model.elements.elements_using(drop) {
            let element = model.elements.get(nb)?;
            match element.try_replace_node(drop, keep) {
                Some(rewired) => {
                    model.elements.replace(nb, rewired)?;
                    report.elements_rewired += 1;
                }
                None => {
                    model.elements.remove(nb)?;
                    report.elements_removed += 1;
                }
            }
        }
        if model.elements.count_node_usage(drop) == 0 && model.nodes.contains(drop) {
            model.nodes.remove(drop)?;
            report.nodes_removed += 1;
        }
    }

    log.line(&format!(
        "Collapse short elements (< {tol}): removed={}, rewired={}, nodes removed={}",
        report.elements_removed, report.elements_rewired, report.nodes_removed
    ));
    Ok(report)
}

/// Deletes elements shorter than `max_len` with at least one free end, then
/// any of their nodes left unused.
pub fn remove_dangling_short_elements(
    model: &mut FeModel,
    max_len: f64,
    log: LogFn<'_>,
) -> Result<CleanupReport> {
    let mut log = LogSink::new(log);
    let mut report = CleanupReport::default();
    let mut degree = node_degree(model);

    for eid in model.elements.ids() {
        let Ok(seg) = model.segment(eid) else {
            continue;
        };
        let deg = |n: i32| degree.get(&n).copied().unwrap_or(0);
        if seg.length() >= max_len || (deg(seg.start_id) != 1 && deg(seg.end_id) != 1) {
            continue;
        }
        let element = model.elements.remove(eid)?;
        report.elements_removed += 1;
        for &nid in element.node_ids() {
            let d = degree.entry(nid).or_insert(0);
            *d = d.saturating_sub(1);
            if *d == 0 && model.nodes.contains(nid) {
                model.nodes.remove(nid)?;
                report.nodes_removed += 1;
            }
        }
    }

    log.line(&format!(
        "Remove dangling elements (< {max_len}): removed={}, nodes removed={}",
        report.elements_removed, report.nodes_removed
    ));
    Ok(report)
}

/// Deletes elements whose endpoints are closer than `tol`, or that reference
/// a missing node.
pub fn remove_zero_length_elements(model: &mut FeModel, tol: f64) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    for eid in model.elements.ids() {
        let degenerate = model.element_length(eid).map_or(true, |len| len < tol);
        if degenerate {
            model.elements.remove(eid)?;
            report.elements_removed += 1;
        }
    }
    if report.elements_removed > 0 {
        tracing::debug!(removed = report.elements_removed, "zero-length elements removed");
    }
    Ok(report)
}

/// Removes nodes no element references, except `protected` ones.
pub fn sweep_orphan_nodes(model: &mut FeModel, protected: &BTreeSet<i32>) -> Result<CleanupReport> {
    let used = model.elements.node_usage();
    let mut report = CleanupReport::default();
    for nid in model.nodes.ids() {
        if !used.contains_key(&nid) && !protected.contains(&nid) {
            model.nodes.remove(nid)?;
            report.nodes_removed += 1;
        }
    }
    if report.nodes_removed > 0 {
        tracing::debug!(removed = report.nodes_removed, "orphan nodes swept");
    }
    Ok(report)
}
