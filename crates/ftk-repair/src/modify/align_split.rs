//! Aligns overlapping collinear members onto one reference line and cuts
//! them at a shared set of stations.
//!
//! Group nodes are snapped onto the line without merging, so split stations
//! carried by near-duplicate nodes survive until the cut. Only the final
//! segment nodes go through coordinate deduplication.

use std::collections::{BTreeMap, BTreeSet};

use ftk_model::{FeModel, Point3, Segment, Vector3};
use serde::Serialize;

use crate::error::Result;
use crate::geometry::{EPS, centroid, projection, unit_direction};
use crate::log::{LogFn, LogSink};
use crate::modify::chain;
use crate::tolerance::{merge_close, sort_and_merge};

#[derive(Debug, Clone, PartialEq)]
pub struct AlignSplitOptions {
    /// Stations closer than this along the reference line are one station
    pub t_tol: f64,
    pub min_seg_len_tol: f64,
    /// Give group nodes that are also used outside the group a fresh id before snapping
    pub clone_external_nodes: bool,
    pub debug: bool,
    pub dry_run: bool,
}

impl Default for AlignSplitOptions {
    fn default() -> Self {
        Self {
            t_tol: 0.05,
            min_seg_len_tol: 1e-3,
            clone_external_nodes: false,
            debug: false,
            dry_run: false,
        }
    }
}

impl AlignSplitOptions {
    #[must_use]
    pub fn with_t_tol(mut self, tol: f64) -> Self {
        self.t_tol = tol;
        self
    }

    #[must_use]
    pub fn with_min_seg_len_tol(mut self, tol: f64) -> Self {
        self.min_seg_len_tol = tol;
        self
    }

    #[must_use]
    pub fn with_clone_external_nodes(mut self, clone: bool) -> Self {
        self.clone_external_nodes = clone;
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
pub struct AlignSplitReport {
    pub groups_processed: usize,
    /// Groups without a usable reference line; their members were deleted
    pub groups_skipped: usize,
    pub nodes_snapped: usize,
    pub nodes_cloned: usize,
    pub elements_removed: usize,
    pub segments_created: usize,
    /// Members already matching their single span
    pub elements_unchanged: usize,
}

/// Origin and unit direction shared by a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLine {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl ReferenceLine {
    /// Centroid of all endpoints, length-weighted mean direction with every
    /// member flipped to agree with the longest one. Falls back to the
    /// longest member's direction when the weighted sum vanishes.
    pub fn fit(segments: &[Segment]) -> Option<Self> {
        let points: Vec<Point3<f64>> = segments.iter().flat_map(|s| [s.start, s.end]).collect();
        let origin = centroid(&points)?;
        let longest = segments
            .iter()
            .max_by(|a, b| a.length().total_cmp(&b.length()))?;
        let reference = unit_direction(&longest.start, &longest.end)?;

        let mut sum = Vector3::zeros();
        for seg in segments {
            if let Some(u) = unit_direction(&seg.start, &seg.end) {
                let u = if u.dot(&reference) < 0.0 { -u } else { u };
                sum += u * seg.length();
            }
        }
        let norm = sum.norm();
        let direction = if norm > EPS { sum / norm } else { reference };
        Some(Self { origin, direction })
    }

    pub fn station(&self, p: &Point3<f64>) -> f64 {
        projection::onto_axis(p, &self.origin, &self.direction).0
    }

    pub fn foot(&self, p: &Point3<f64>) -> Point3<f64> {
        projection::onto_axis(p, &self.origin, &self.direction).1
    }
}

/// Stations of the global set falling inside `[lo - tol, hi + tol]`, merged again.
fn local_stations(global: &[f64], lo: f64, hi: f64, tol: f64) -> Vec<f64> {
    let inside: Vec<f64> = global
        .iter()
        .copied()
        .filter(|t| *t >= lo - tol && *t <= hi + tol)
        .collect();
    merge_close(&inside, tol)
}

/// Runs the pass over precomputed overlap groups.
pub fn run(
    model: &mut FeModel,
    groups: &[Vec<i32>],
    opt: &AlignSplitOptions,
    log: LogFn<'_>,
) -> Result<AlignSplitReport> {
    let mut log = LogSink::new(log);
    let mut report = AlignSplitReport::default();
    log.line(&format!(
        "Align-split: {} group(s), t_tol={}, min_seg={}",
        groups.len(),
        opt.t_tol,
        opt.min_seg_len_tol
    ));

    for (gi, group) in groups.iter().enumerate() {
        let outcome = if opt.dry_run {
            preview_group(model, group, opt, &mut report)
        } else {
            process_group(model, group, opt, &mut report)
        };
        match outcome {
            Ok(segments) if opt.debug => {
                log.line(&format!("  group {gi}: {} member(s) -> {segments} segment(s)", group.len()));
            }
            Ok(_) => {}
            Err(e) => log.warn(&format!("  group {gi} skipped: {e}")),
        }
    }

    log.line(&format!(
        "Align-split done: processed={}, skipped={}, snapped={}, cloned={}, removed={}, created={}, unchanged={}",
        report.groups_processed,
        report.groups_skipped,
        report.nodes_snapped,
        report.nodes_cloned,
        report.elements_removed,
        report.segments_created,
        report.elements_unchanged
    ));
    Ok(report)
}

fn live_members(model: &FeModel, group: &[i32]) -> Vec<i32> {
    let set: BTreeSet<i32> = group
        .iter()
        .copied()
        .filter(|eid| model.elements.contains(*eid))
        .collect();
    set.into_iter().collect()
}

fn preview_group(
    model: &FeModel,
    group: &[i32],
    opt: &AlignSplitOptions,
    report: &mut AlignSplitReport,
) -> Result<usize> {
    let members = live_members(model, group);
    let segments: Vec<Segment> = members
        .iter()
        .filter_map(|&eid| model.segment(eid).ok())
        .collect();
    let Some(line) = ReferenceLine::fit(&segments) else {
        report.groups_skipped += 1;
        return Ok(0);
    };
    report.groups_processed += 1;

    let spans: Vec<(f64, f64)> = segments
        .iter()
        .map(|s| (line.station(&s.start), line.station(&s.end)))
        .collect();
    let global = sort_and_merge(spans.iter().flat_map(|&(a, b)| [a, b]).collect(), opt.t_tol);

    let mut total = 0;
    for (t0, t1) in spans {
        let local = local_stations(&global, t0.min(t1), t0.max(t1), opt.t_tol);
        total += local.len().saturating_sub(1);
    }
    report.segments_created += total;
    Ok(total)
}

fn process_group(
    model: &mut FeModel,
    group: &[i32],
    opt: &AlignSplitOptions,
    report: &mut AlignSplitReport,
) -> Result<usize> {
    let members = live_members(model, group);
    let segments: Vec<Segment> = members
        .iter()
        .filter_map(|&eid| model.segment(eid).ok())
        .collect();

    let Some(line) = ReferenceLine::fit(&segments) else {
        for &eid in &members {
            model.elements.remove(eid)?;
            report.elements_removed += 1;
        }
        report.groups_skipped += 1;
        return Ok(0);
    };
    report.groups_processed += 1;

    let in_group: BTreeSet<i32> = members.iter().copied().collect();
    let mut group_nodes = BTreeSet::new();
    for &eid in &members {
        group_nodes.extend(model.elements.get(eid)?.node_ids().iter().copied());
    }

    let mut remap: BTreeMap<i32, i32> = BTreeMap::new();
    if opt.clone_external_nodes {
        for &nid in &group_nodes {
            let external = model
                .elements
                .elements_using(nid)
                .iter()
                .any(|eid| !in_group.contains(eid));
            if external && let Ok(p) = model.nodes.get(nid) {
                remap.insert(nid, model.nodes.allocate(p));
                report.nodes_cloned += 1;
            }
        }
    }

    let mut snapped = BTreeSet::new();
    for &nid in &group_nodes {
        let target = remap.get(&nid).copied().unwrap_or(nid);
        let Ok(p) = model.nodes.get(target) else {
            continue;
        };
        let foot = line.foot(&p);
        if (foot - p).norm() > EPS {
            model.nodes.set_position(target, foot)?;
            report.nodes_snapped += 1;
            snapped.insert(target);
        }
    }

    // elements outside the group can collapse when both their nodes moved
    let collapsed = chain::remove_collapsed(model, &snapped, &in_group, opt.min_seg_len_tol)?;
    report.elements_removed += collapsed.len();

    // re-install with remapped ids, dropping members that collapsed
    let mut live = Vec::with_capacity(members.len());
    for &eid in &members {
        let element = model.elements.get(eid)?.clone();
        let ids: Vec<i32> = element
            .node_ids()
            .iter()
            .map(|n| remap.get(n).copied().unwrap_or(*n))
            .collect();
        if ids.as_slice() != element.node_ids() {
            match element.with_node_ids(ids) {
                Ok(moved) => {
                    model.elements.replace(eid, moved)?;
                }
                Err(_) => {
                    model.elements.remove(eid)?;
                    report.elements_removed += 1;
                    continue;
                }
            }
        }
        match model.element_length(eid) {
            Ok(len) if len >= opt.min_seg_len_tol => live.push(eid),
            _ => {
                model.elements.remove(eid)?;
                report.elements_removed += 1;
            }
        }
    }

    let mut spans = Vec::with_capacity(live.len());
    for &eid in &live {
        let seg = model.segment(eid)?;
        spans.push((eid, seg, line.station(&seg.start), line.station(&seg.end)));
    }
    let global = sort_and_merge(
        spans.iter().flat_map(|&(_, _, a, b)| [a, b]).collect(),
        opt.t_tol,
    );

    let mut created = 0;
    for (eid, seg, t0, t1) in spans {
        let local = local_stations(&global, t0.min(t1), t0.max(t1), opt.t_tol);
        let mut nodes: Vec<i32> = local
            .iter()
            .map(|t| model.nodes.get_or_create_at(&line.origin, &line.direction, *t))
            .collect();
        if t0 > t1 {
            nodes.reverse();
        }

        if nodes == [seg.start_id, seg.end_id] {
            report.elements_unchanged += 1;
            continue;
        }

        let rebuilt = chain::rebuild_element(model, eid, &nodes, opt.min_seg_len_tol, false)?;
        report.elements_removed += 1;
        report.segments_created += rebuilt.segments;
        created += rebuilt.segments;
    }
    Ok(created)
}
