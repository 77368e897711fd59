//! Whole-model health check run between pipeline stages.
//!
//! The inspection never mutates the model. Each enabled check yields a
//! verdict line through the log sink and its raw findings in the report.

use ftk_model::{FeModel, IntegrityIssue};
use serde::Serialize;

use crate::inspect::{connectivity, duplicate, integrity};
use crate::log::{LogFn, LogSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Check {
    /// Connected pieces, free ends, unused nodes
    Topology,
    /// Elements below the short-length threshold
    Geometry,
    /// Distinct nodes at the same location
    Equivalence,
    /// Elements with identical node sets
    Duplicate,
    /// Broken node, property or material references
    Integrity,
    /// Elements connected to nothing
    Isolation,
}

impl Check {
    pub const ALL: [Check; 6] = [
        Check::Topology,
        Check::Geometry,
        Check::Equivalence,
        Check::Duplicate,
        Check::Integrity,
        Check::Isolation,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Verdict {
    Pass,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SanityOptions {
    pub checks: Vec<Check>,
    pub short_element_tol: f64,
    pub equivalence_tol: f64,
    /// List offending ids in the log
    pub debug: bool,
    /// Ids printed per finding in debug mode
    pub max_print: usize,
}

impl Default for SanityOptions {
    fn default() -> Self {
        Self {
            checks: Check::ALL.to_vec(),
            short_element_tol: 1.0,
            equivalence_tol: 0.1,
            debug: false,
            max_print: 20,
        }
    }
}

impl SanityOptions {
    #[must_use]
    pub fn only(mut self, checks: &[Check]) -> Self {
        self.checks = checks.to_vec();
        self
    }

    #[must_use]
    pub fn with_short_element_tol(mut self, tol: f64) -> Self {
        self.short_element_tol = tol;
        self
    }

    #[must_use]
    pub fn with_equivalence_tol(mut self, tol: f64) -> Self {
        self.equivalence_tol = tol;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn enabled(&self, check: Check) -> bool {
        self.checks.contains(&check)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub check: Check,
    pub verdict: Verdict,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SanityReport {
    pub results: Vec<CheckResult>,
    pub connected_groups: usize,
    pub free_end_nodes: Vec<i32>,
    pub orphan_nodes: Vec<i32>,
    pub short_elements: Vec<(i32, f64)>,
    pub coincident_node_groups: Vec<Vec<i32>>,
    pub duplicate_groups: Vec<Vec<i32>>,
    pub invalid_references: Vec<IntegrityIssue>,
    pub isolated_elements: Vec<i32>,
}

impl SanityReport {
    pub fn worst(&self) -> Verdict {
        self.results
            .iter()
            .map(|r| r.verdict)
            .max()
            .unwrap_or(Verdict::Pass)
    }

    pub fn is_clean(&self) -> bool {
        self.worst() == Verdict::Pass
    }

    fn record(&mut self, log: &mut LogSink<'_>, check: Check, verdict: Verdict, message: String) {
        let tag = match verdict {
            Verdict::Pass => "PASS",
            Verdict::Warning => "WARN",
            Verdict::Critical => "CRIT",
        };
        let line = format!("[{tag}] {check:?}: {message}");
        if verdict == Verdict::Pass {
            log.line(&line);
        } else {
            log.warn(&line);
        }
        self.results.push(CheckResult {
            check,
            verdict,
            message,
        });
    }
}

fn summarize(ids: &[i32], max: usize) -> String {
    let shown: Vec<String> = ids.iter().take(max).map(i32::to_string).collect();
    if ids.len() > max {
        format!("{} ... (+{})", shown.join(", "), ids.len() - max)
    } else {
        shown.join(", ")
    }
}

/// Runs the enabled checks in fixed order.
pub fn inspect(model: &FeModel, opt: &SanityOptions, log: LogFn<'_>) -> SanityReport {
    let mut log = LogSink::new(log);
    let mut report = SanityReport::default();

    if opt.enabled(Check::Topology) {
        let groups = connectivity::connected_element_groups(model);
        report.connected_groups = groups.len();
        report.free_end_nodes = connectivity::free_end_nodes(model);
        report.orphan_nodes = connectivity::orphan_nodes(model);

        let verdict = if groups.len() <= 1 && report.orphan_nodes.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Warning
        };
        let msg = format!(
            "{} connected group(s), {} free end(s), {} unused node(s)",
            groups.len(),
            report.free_end_nodes.len(),
            report.orphan_nodes.len()
        );
        report.record(&mut log, Check::Topology, verdict, msg);
        if opt.debug && !report.orphan_nodes.is_empty() {
            log.line(&format!("    unused: {}", summarize(&report.orphan_nodes, opt.max_print)));
        }
    }

    if opt.enabled(Check::Geometry) {
        report.short_elements = integrity::find_short_elements(model, opt.short_element_tol);
        let n = report.short_elements.len();
        let verdict = if n == 0 { Verdict::Pass } else { Verdict::Warning };
        let msg = format!("{n} element(s) shorter than {}", opt.short_element_tol);
        report.record(&mut log, Check::Geometry, verdict, msg);
        if opt.debug && n > 0 {
            let ids: Vec<i32> = report.short_elements.iter().map(|(id, _)| *id).collect();
            log.line(&format!("    ids: {}", summarize(&ids, opt.max_print)));
        }
    }

    if opt.enabled(Check::Equivalence) {
        report.coincident_node_groups = integrity::find_coincident_nodes(model, opt.equivalence_tol);
        let n = report.coincident_node_groups.len();
        let verdict = if n == 0 { Verdict::Pass } else { Verdict::Warning };
        let msg = format!("{n} coincident node group(s) within {}", opt.equivalence_tol);
        report.record(&mut log, Check::Equivalence, verdict, msg);
        if opt.debug {
            for group in report.coincident_node_groups.iter().take(10) {
                log.line(&format!("    [{}]", summarize(group, opt.max_print)));
            }
        }
    }

    if opt.enabled(Check::Duplicate) {
        report.duplicate_groups = duplicate::find_duplicate_groups(model);
        let n = report.duplicate_groups.len();
        let verdict = if n == 0 { Verdict::Pass } else { Verdict::Critical };
        report.record(&mut log, Check::Duplicate, verdict, format!("{n} duplicate element set(s)"));
        if opt.debug {
            for group in report.duplicate_groups.iter().take(opt.max_print) {
                log.line(&format!("    [{}]", summarize(group, opt.max_print)));
            }
        }
    }

    if opt.enabled(Check::Integrity) {
        report.invalid_references = integrity::find_invalid_references(model);
        let n = report.invalid_references.len();
        let verdict = if n == 0 { Verdict::Pass } else { Verdict::Critical };
        report.record(&mut log, Check::Integrity, verdict, format!("{n} broken reference(s)"));
        if opt.debug {
            for issue in report.invalid_references.iter().take(opt.max_print) {
                log.line(&format!("    {issue}"));
            }
        }
    }

    if opt.enabled(Check::Isolation) {
        report.isolated_elements = connectivity::isolated_elements(model);
        let n = report.isolated_elements.len();
        let verdict = if n == 0 { Verdict::Pass } else { Verdict::Warning };
        report.record(&mut log, Check::Isolation, verdict, format!("{n} isolated element(s)"));
        if opt.debug && n > 0 {
            log.line(&format!("    ids: {}", summarize(&report.isolated_elements, opt.max_print)));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftk_model::{Element, Material, Point3, Property, PropertyKind};

    fn healthy() -> FeModel {
        let mut model = FeModel::new();
        let mat = model
            .materials
            .add_or_get(Material::new("Steel", 206_000.0, 0.3, 7.85e-9).unwrap());
        let pid = model
            .properties
            .add_or_get(Property::new(PropertyKind::Pbeam, vec![1.0], mat).unwrap());
        for i in 0..3 {
            model.nodes.add_with_id(i + 1, Point3::new(i as f64 * 100.0, 0.0, 0.0));
        }
        model.elements.add_new(Element::line(1, 2, pid).unwrap());
        model.elements.add_new(Element::line(2, 3, pid).unwrap());
        model
    }

    #[test]
    fn healthy_model_passes_every_check() {
        let mut lines = Vec::new();
        let mut sink = |s: &str| lines.push(s.to_string());
        let report = inspect(&healthy(), &SanityOptions::default(), Some(&mut sink));
        assert!(report.is_clean());
        assert_eq!(report.results.len(), 6);
        assert_eq!(report.free_end_nodes, vec![1, 3]);
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn duplicates_are_critical_and_nothing_is_removed() {
        let mut model = healthy();
        model.elements.add_new(Element::line(2, 1, 1).unwrap());
        model.elements.add_new(Element::line(3, 99, 1).unwrap());
        let before = model.elements.len();

        let mut sink = |_: &str| {};
        let report = inspect(&model, &SanityOptions::default(), Some(&mut sink));
        assert_eq!(report.worst(), Verdict::Critical);
        assert_eq!(report.duplicate_groups, vec![vec![1, 3]]);
        assert_eq!(report.invalid_references.len(), 1);
        assert_eq!(model.elements.len(), before);
    }

    #[test]
    fn disabled_checks_are_skipped() {
        let mut sink = |_: &str| {};
        let opt = SanityOptions::default().only(&[Check::Duplicate]);
        let report = inspect(&healthy(), &opt, Some(&mut sink));
        assert_eq!(report.results.len(), 1);
        assert!(report.free_end_nodes.is_empty());
    }
}
