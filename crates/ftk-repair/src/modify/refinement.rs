//! Subdivides elements longer than a target size.

use ftk_model::FeModel;
use serde::Serialize;

use crate::error::{RepairError, Result};
use crate::log::{LogFn, LogSink};
use crate::modify::chain;

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementOptions {
    pub target_size: f64,
    pub debug: bool,
    pub dry_run: bool,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            target_size: 500.0,
            debug: false,
            dry_run: false,
        }
    }
}

impl RefinementOptions {
    #[must_use]
    pub fn with_target_size(mut self, size: f64) -> Self {
        self.target_size = size;
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
pub struct RefinementReport {
    pub elements_scanned: usize,
    pub elements_refined: usize,
    pub segments_created: usize,
    pub nodes_created: usize,
}

/// Replaces every element longer than `target_size` by
/// `ceil(length / target_size)` equal pieces running start to end.
pub fn run(model: &mut FeModel, opt: &RefinementOptions, log: LogFn<'_>) -> Result<RefinementReport> {
    if !(opt.target_size.is_finite() && opt.target_size > 0.0) {
        return Err(RepairError::InvalidOptions(format!(
            "target mesh size must be positive, got {}",
            opt.target_size
        )));
    }
    let mut log = LogSink::new(log);
    let mut report = RefinementReport::default();

    for eid in model.elements.ids() {
        report.elements_scanned += 1;
        let seg = match model.segment(eid) {
            Ok(s) => s,
            Err(e) => {
                log.warn(&format!("  element {eid} skipped: {e}"));
                continue;
            }
        };
        let len = seg.length();
        if len <= opt.target_size {
            continue;
        }
        let pieces = (len / opt.target_size).ceil() as usize;
        if pieces < 2 {
            continue;
        }

        report.elements_refined += 1;
        if opt.debug {
            log.line(&format!("  element {eid}: length {len:.3} -> {pieces} piece(s)"));
        }
        if opt.dry_run {
            report.segments_created += pieces;
            continue;
        }

        let before = model.nodes.len();
        let interior: Vec<i32> = (1..pieces)
            .map(|i| model.nodes.add_or_get(seg.point_at(i as f64 / pieces as f64)))
            .collect();
        report.nodes_created += model.nodes.len() - before;

        let nodes = chain::build_chain(seg.start_id, &interior, seg.end_id);
        let rebuilt = chain::rebuild_element(model, eid, &nodes, 0.0, false)?;
        report.segments_created += rebuilt.segments;
    }

    log.line(&format!(
        "Mesh refinement (target {}): scanned={}, refined={}, segments={}, new nodes={}",
        opt.target_size,
        report.elements_scanned,
        report.elements_refined,
        report.segments_created,
        report.nodes_created
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ftk_model::{Element, Point3};

    fn single(len: f64) -> FeModel {
        let mut model = FeModel::new();
        model.nodes.add_with_id(1, Point3::new(0.0, 0.0, 0.0));
        model.nodes.add_with_id(2, Point3::new(len, 0.0, 0.0));
        model
            .elements
            .add_with_id(1, Element::line(1, 2, 7).unwrap().with_extra_entry("GROUP", "deck"));
        model
    }

    #[test]
    fn long_element_is_cut_evenly() {
        let mut model = single(1200.0);
        let mut sink = |_: &str| {};
        let report = run(&mut model, &RefinementOptions::default(), Some(&mut sink)).unwrap();
        assert_eq!(report.elements_refined, 1);
        assert_eq!(report.segments_created, 3);
        assert_eq!(report.nodes_created, 2);
        assert!(!model.elements.contains(1));

        let total: f64 = model.elements.ids().iter().map(|&e| model.element_length(e).unwrap()).sum();
        assert_relative_eq!(total, 1200.0, epsilon = 1e-9);
        for eid in model.elements.ids() {
            let el = model.elements.get(eid).unwrap();
            assert_eq!(el.property_id(), 7);
            assert_eq!(el.extra().get("GROUP").map(String::as_str), Some("deck"));
            assert_relative_eq!(model.element_length(eid).unwrap(), 400.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn direction_is_preserved() {
        let mut model = single(1000.0);
        let mut sink = |_: &str| {};
        run(&mut model, &RefinementOptions::default().with_target_size(300.0), Some(&mut sink)).unwrap();
        let ids = model.elements.ids();
        assert_eq!(ids.len(), 4);
        assert_eq!(model.elements.get(ids[0]).unwrap().node_ids()[0], 1);
        assert_eq!(model.elements.get(ids[3]).unwrap().node_ids()[1], 2);
    }

    #[test]
    fn short_elements_are_untouched() {
        let mut model = single(500.0);
        let mut sink = |_: &str| {};
        let report = run(&mut model, &RefinementOptions::default(), Some(&mut sink)).unwrap();
        assert_eq!(report.elements_refined, 0);
        assert!(model.elements.contains(1));
    }

    #[test]
    fn non_positive_target_is_rejected() {
        let mut model = single(1000.0);
        for bad in [0.0, -1.0, f64::NAN] {
            let err = run(&mut model, &RefinementOptions::default().with_target_size(bad), None).unwrap_err();
            assert!(matches!(err, RepairError::InvalidOptions(_)));
        }
    }
}
