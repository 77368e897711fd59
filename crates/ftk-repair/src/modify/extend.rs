//! Extends free element ends until they meet another member.
//!
//! Each degree-1 node casts a ray along its element's outward direction. The
//! reach scales with the element's section size. The nearest member hit is
//! split at the hit point and the free node moves onto it.

use std::collections::BTreeMap;

use ftk_model::{FeModel, Point3};
use serde::Serialize;

use crate::error::Result;
use crate::geometry::{Aabb, projection, ray_segment_hit, unit_direction};
use crate::inspect::free_end_nodes;
use crate::log::{LogFn, LogSink};
use crate::modify::chain;
use crate::spatial_hash::SpatialHash;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendOptions {
    /// Reach as a multiple of the element's section reference dimension
    pub search_ratio: f64,
    /// Reach floor; also used when the property gives no dimension
    pub default_search_dist: f64,
    pub max_search_dist: f64,
    /// Largest miss between ray and member still counted as a hit
    pub intersection_tol: f64,
    pub grid_cell_size: f64,
    pub debug: bool,
    pub dry_run: bool,
}

impl Default for ExtendOptions {
    fn default() -> Self {
        Self {
            search_ratio: 5.0,
            default_search_dist: 100.0,
            max_search_dist: 2000.0,
            intersection_tol: 1.0,
            grid_cell_size: 50.0,
            debug: false,
            dry_run: false,
        }
    }
}

impl ExtendOptions {
    #[must_use]
    pub fn with_search_ratio(mut self, ratio: f64) -> Self {
        self.search_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_default_search_dist(mut self, dist: f64) -> Self {
        self.default_search_dist = dist;
        self
    }

    #[must_use]
    pub fn with_max_search_dist(mut self, dist: f64) -> Self {
        self.max_search_dist = dist;
        self
    }

    #[must_use]
    pub fn with_intersection_tol(mut self, tol: f64) -> Self {
        self.intersection_tol = tol;
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

    fn reach(&self, reference_dimension: f64) -> f64 {
        let dist = if reference_dimension > 0.0 {
            self.default_search_dist.max(reference_dimension * self.search_ratio)
        } else {
            self.default_search_dist
        };
        dist.min(self.max_search_dist)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtendReport {
    pub free_nodes_checked: usize,
    pub extensions_found: usize,
    pub connections_made: usize,
    pub targets_split: usize,
}

/// A free end and the member its ray reaches first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extension {
    pub free_node: i32,
    pub source_element: i32,
    pub target_element: i32,
    pub point: Point3<f64>,
    pub distance: f64,
}

/// Ray-casts every free end against the current model.
pub fn find_extensions(model: &FeModel, opt: &ExtendOptions) -> (usize, Vec<Extension>) {
    let free = free_end_nodes(model);
    let grid = SpatialHash::for_elements(model, opt.grid_cell_size, opt.intersection_tol);
    let mut found = Vec::new();

    for &nid in &free {
        let Some(&source) = model.elements.elements_using(nid).first() else {
            continue;
        };
        let Ok(seg) = model.segment(source) else {
            continue;
        };
        let (p_free, p_other) = if seg.end_id == nid {
            (seg.end, seg.start)
        } else if seg.start_id == nid {
            (seg.start, seg.end)
        } else {
            continue;
        };
        let Some(dir) = unit_direction(&p_other, &p_free) else {
            continue;
        };

        let ref_dim = model
            .elements
            .get(source)
            .and_then(|e| model.properties.get(e.property_id()))
            .map(|p| p.reference_dimension())
            .unwrap_or(0.0);
        let reach = opt.reach(ref_dim);
        let ray_end = p_free + dir * reach;
        let search = Aabb::from_segment(&p_free, &ray_end, opt.intersection_tol);

        let mut best: Option<Extension> = None;
        for cand in grid.query(&search) {
            if cand == source {
                continue;
            }
            let Ok(target) = model.segment(cand) else {
                continue;
            };
            let Some(hit) = ray_segment_hit(&p_free, &dir, reach, &target.start, &target.end, opt.intersection_tol)
            else {
                continue;
            };
            if best.is_none_or(|b| hit.distance < b.distance) {
                best = Some(Extension {
                    free_node: nid,
                    source_element: source,
                    target_element: cand,
                    point: hit.point,
                    distance: hit.distance,
                });
            }
        }
        found.extend(best);
    }
    (free.len(), found)
}

pub fn run(model: &mut FeModel, opt: &ExtendOptions, log: LogFn<'_>) -> Result<ExtendReport> {
    let mut log = LogSink::new(log);
    let (checked, extensions) = find_extensions(model, opt);
    let mut report = ExtendReport {
        free_nodes_checked: checked,
        extensions_found: extensions.len(),
        ..Default::default()
    };

    if opt.debug {
        for ext in &extensions {
            log.line(&format!(
                "  node {} (element {}) -> element {} at {:.3}",
                ext.free_node, ext.source_element, ext.target_element, ext.distance
            ));
        }
    }
    if opt.dry_run {
        log.line(&summary(&report, true));
        return Ok(report);
    }

    let mut targets: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for ext in &extensions {
        let hit_node = model.nodes.add_or_get(ext.point);
        if hit_node != ext.free_node {
            let source = model.elements.get(ext.source_element)?;
            match source.try_replace_node(ext.free_node, hit_node) {
                Some(moved) => {
                    model.elements.replace(ext.source_element, moved)?;
                }
                None => {
                    log.warn(&format!(
                        "  element {} cannot reach node {hit_node}, skipped",
                        ext.source_element
                    ));
                    continue;
                }
            }
        }
        report.connections_made += 1;
        targets.entry(ext.target_element).or_default().push(hit_node);
    }

    for (target, hit_nodes) in targets {
        let seg = match model.segment(target) {
            Ok(s) => s,
            Err(e) => {
                log.warn(&format!("  target {target} not split: {e}"));
                continue;
            }
        };
        let mut stations: Vec<(f64, i32)> = Vec::with_capacity(hit_nodes.len());
        for nid in hit_nodes {
            let p = model.nodes.get(nid)?;
            stations.push((projection::parameter(&p, &seg.start, &seg.end), nid));
        }
        stations.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let interior: Vec<i32> = stations.into_iter().map(|(_, nid)| nid).collect();

        let nodes = chain::build_chain(seg.start_id, &interior, seg.end_id);
        if nodes.len() <= 2 {
            continue;
        }
        chain::rebuild_element(model, target, &nodes, 1e-6, false)?;
        report.targets_split += 1;
    }

    log.line(&summary(&report, false));
    Ok(report)
}

fn summary(r: &ExtendReport, dry_run: bool) -> String {
    format!(
        "Free-end extension{}: checked={}, found={}, connected={}, targets split={}",
        if dry_run { " (dry run)" } else { "" },
        r.free_nodes_checked,
        r.extensions_found,
        r.connections_made,
        r.targets_split
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftk_model::{Element, Material, Property, PropertyKind};

    /// Horizontal member at y = 0 and a vertical stub ending short of it.
    fn gap(stub_bottom: f64) -> FeModel {
        let mut model = FeModel::new();
        let mat = model
            .materials
            .add_or_get(Material::new("Steel", 206_000.0, 0.3, 7.85e-9).unwrap());
        let pid = model
            .properties
            .add_or_get(Property::new(PropertyKind::Pbeam, vec![10.0], mat).unwrap());
        model.nodes.add_with_id(1, Point3::new(0.0, 0.0, 0.0));
        model.nodes.add_with_id(2, Point3::new(200.0, 0.0, 0.0));
        model.nodes.add_with_id(3, Point3::new(80.0, 300.0, 0.0));
        model.nodes.add_with_id(4, Point3::new(80.0, stub_bottom, 0.0));
        model.elements.add_with_id(1, Element::line(1, 2, pid).unwrap());
        model.elements.add_with_id(2, Element::line(3, 4, pid).unwrap());
        model
    }

    #[test]
    fn reach_scales_with_section_and_is_capped() {
        let opt = ExtendOptions::default();
        assert_eq!(opt.reach(0.0), 100.0);
        assert_eq!(opt.reach(10.0), 100.0);
        assert_eq!(opt.reach(100.0), 500.0);
        assert_eq!(opt.reach(1000.0), 2000.0);
    }

    #[test]
    fn free_end_connects_and_splits_target() {
        let mut model = gap(40.0);
        let mut sink = |_: &str| {};
        let report = run(&mut model, &ExtendOptions::default(), Some(&mut sink)).unwrap();

        assert_eq!(report.extensions_found, 1);
        assert_eq!(report.connections_made, 1);
        assert_eq!(report.targets_split, 1);

        let hit = model.nodes.find_ids(&Point3::new(80.0, 0.0, 0.0));
        assert_eq!(hit.len(), 1);
        assert_eq!(model.elements.get(2).unwrap().node_ids(), &[3, hit[0]]);
        assert_eq!(model.elements.count_node_usage(hit[0]), 3);
        assert!(!model.elements.contains(1));
    }

    #[test]
    fn gap_beyond_reach_is_left_open() {
        let mut model = gap(150.0);
        let mut sink = |_: &str| {};
        let report = run(&mut model, &ExtendOptions::default(), Some(&mut sink)).unwrap();
        assert_eq!(report.extensions_found, 0);
        assert_eq!(model.elements.len(), 2);
    }

    #[test]
    fn dry_run_only_counts() {
        let mut model = gap(40.0);
        let mut sink = |_: &str| {};
        let report = run(&mut model, &ExtendOptions::default().with_dry_run(true), Some(&mut sink)).unwrap();
        assert_eq!(report.free_nodes_checked, 4);
        assert_eq!(report.extensions_found, 1);
        assert_eq!(report.connections_made, 0);
        assert_eq!(model.nodes.len(), 4);
    }

    #[test]
    fn ray_just_past_target_end_joins_the_end_node() {
        let mut model = gap(40.0);
        model.nodes.add_with_id(3, Point3::new(200.5, 300.0, 0.0));
        model.nodes.add_with_id(4, Point3::new(200.5, 40.0, 0.0));
        let mut sink = |_: &str| {};
        let report = run(&mut model, &ExtendOptions::default(), Some(&mut sink)).unwrap();

        assert_eq!(report.connections_made, 1);
        assert_eq!(report.targets_split, 0);
        assert_eq!(model.elements.get(1).unwrap().node_ids(), &[1, 2]);
        assert_eq!(model.elements.get(2).unwrap().node_ids(), &[3, 2]);
        assert!(model.nodes.find_ids(&Point3::new(200.5, 0.0, 0.0)).is_empty());
    }
}
