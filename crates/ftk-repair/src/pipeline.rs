//! Staged repair driver.
//!
//! Stages run in a fixed order over one mutable model. Every stage derives
//! its indexes and groups from the model as the previous stage left it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use ftk_model::FeModel;
use serde::Serialize;

use crate::error::{RepairError, Result};
use crate::inspect::{self, CollinearOptions, SanityOptions, SanityReport};
use crate::log::{LogFn, LogSink};
use crate::modify::{
    self, AlignSplitOptions, AlignSplitReport, CleanupReport, DuplicateMergeOptions,
    DuplicateMergeReport, ExtendOptions, ExtendReport, IntersectionSplitOptions,
    IntersectionSplitReport, RefinementOptions, RefinementReport, SplitByNodesOptions,
    SplitByNodesReport,
};

/// Repair stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    /// Align and split overlapping collinear members
    CollinearOverlap,
    /// Split members at existing nodes lying on them
    SplitByNodes,
    /// Split crossing members at a shared node
    IntersectionSplit,
    /// Fold members with identical node sets into equivalent beams
    DuplicateMerge,
    /// Extend free ends onto nearby members
    Extension,
    /// Subdivide members longer than the target size
    MeshRefinement,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::CollinearOverlap,
        Stage::SplitByNodes,
        Stage::IntersectionSplit,
        Stage::DuplicateMerge,
        Stage::Extension,
        Stage::MeshRefinement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CollinearOverlap => "collinear",
            Stage::SplitByNodes => "split-nodes",
            Stage::IntersectionSplit => "intersection",
            Stage::DuplicateMerge => "duplicate",
            Stage::Extension => "extend",
            Stage::MeshRefinement => "refine",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = RepairError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == key)
            .ok_or_else(|| RepairError::InvalidOptions(format!("unknown stage '{s}'")))
    }
}

/// Options for every stage plus the enabled set.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub stages: BTreeSet<Stage>,
    pub collinear: CollinearOptions,
    pub align_split: AlignSplitOptions,
    pub split_by_nodes: SplitByNodesOptions,
    pub intersection_split: IntersectionSplitOptions,
    pub duplicate_merge: DuplicateMergeOptions,
    pub extension: ExtendOptions,
    pub refinement: RefinementOptions,
    /// Collapse elements shorter than this after intersection and extension
    pub collapse_tol: Option<f64>,
    /// Remove dangling elements shorter than this after intersection
    pub dangling_len: Option<f64>,
    /// Remove unused nodes after every stage
    pub sweep_orphans: bool,
    /// Run a sanity inspection after every stage
    pub inspect_after_stage: bool,
    pub sanity: SanityOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: Stage::ALL.into_iter().collect(),
            collinear: CollinearOptions::default(),
            align_split: AlignSplitOptions::default(),
            split_by_nodes: SplitByNodesOptions::default().with_distance_tol(1.0),
            intersection_split: IntersectionSplitOptions::default(),
            duplicate_merge: DuplicateMergeOptions::default(),
            extension: ExtendOptions::default()
                .with_search_ratio(1.2)
                .with_default_search_dist(50.0),
            refinement: RefinementOptions::default(),
            collapse_tol: Some(1.0),
            dangling_len: Some(50.0),
            sweep_orphans: false,
            inspect_after_stage: true,
            sanity: SanityOptions::default(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn with_stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages = stages.into_iter().collect();
        self
    }

    /// Forwards the flag to every stage. Cleanup is skipped in dry runs.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.align_split.dry_run = dry_run;
        self.split_by_nodes.dry_run = dry_run;
        self.intersection_split.dry_run = dry_run;
        self.duplicate_merge.dry_run = dry_run;
        self.extension.dry_run = dry_run;
        self.refinement.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.align_split.debug = debug;
        self.split_by_nodes.debug = debug;
        self.intersection_split.debug = debug;
        self.duplicate_merge.debug = debug;
        self.extension.debug = debug;
        self.refinement.debug = debug;
        self.sanity.debug = debug;
        self
    }

    #[must_use]
    pub fn with_refinement_target(mut self, size: f64) -> Self {
        self.refinement.target_size = size;
        self
    }

    #[must_use]
    pub fn with_sweep_orphans(mut self, sweep: bool) -> Self {
        self.sweep_orphans = sweep;
        self
    }

    #[must_use]
    pub fn with_inspect_after_stage(mut self, inspect: bool) -> Self {
        self.inspect_after_stage = inspect;
        self
    }

    fn is_dry_run(&self) -> bool {
        self.align_split.dry_run
    }
}

/// What a stage's modifier reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StageOutcome {
    AlignSplit(AlignSplitReport),
    SplitByNodes(SplitByNodesReport),
    IntersectionSplit(IntersectionSplitReport),
    DuplicateMerge(DuplicateMergeReport),
    Extension(ExtendReport),
    Refinement(RefinementReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub cleanup: CleanupReport,
    pub nodes_before: usize,
    pub nodes_after: usize,
    pub elements_before: usize,
    pub elements_after: usize,
    pub sanity: Option<SanityReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Inspection of the model as loaded
    pub baseline: SanityReport,
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Audit rows from the duplicate-merge stage, empty if it did not run.
    pub fn merge_audit(&self) -> &[modify::MergeAuditRow] {
        self.stages
            .iter()
            .find_map(|s| match &s.outcome {
                StageOutcome::DuplicateMerge(r) => Some(r.audit.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// Main repair pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the baseline inspection, then every enabled stage in order.
    pub fn run(&self, model: &mut FeModel, log: LogFn<'_>) -> Result<PipelineReport> {
        let mut log = LogSink::new(log);
        let cfg = &self.config;

        log.line("== Baseline inspection ==");
        let baseline = inspect::sanity::inspect(model, &cfg.sanity, log.reborrow());

        let mut stages = Vec::new();
        for stage in Stage::ALL {
            if !cfg.stages.contains(&stage) {
                continue;
            }
            log.line(&format!("== Stage: {stage} =="));
            let nodes_before = model.nodes.len();
            let elements_before = model.elements.len();

            let outcome = self.run_stage(stage, model, &mut log)?;
            let cleanup = if cfg.is_dry_run() {
                CleanupReport::default()
            } else {
                self.cleanup_after(stage, model, &mut log)?
            };

            let sanity = cfg
                .inspect_after_stage
                .then(|| inspect::sanity::inspect(model, &cfg.sanity, log.reborrow()));
            tracing::info!(
                stage = stage.as_str(),
                nodes = model.nodes.len(),
                elements = model.elements.len(),
                "stage finished"
            );

            stages.push(StageReport {
                stage,
                outcome,
                cleanup,
                nodes_before,
                nodes_after: model.nodes.len(),
                elements_before,
                elements_after: model.elements.len(),
                sanity,
            });
        }

        Ok(PipelineReport { baseline, stages })
    }

    fn run_stage(&self, stage: Stage, model: &mut FeModel, log: &mut LogSink<'_>) -> Result<StageOutcome> {
        let cfg = &self.config;
        Ok(match stage {
            Stage::CollinearOverlap => {
                let groups = inspect::find_overlap_groups(model, &cfg.collinear);
                log.line(&format!("  {} overlap group(s)", groups.len()));
                StageOutcome::AlignSplit(modify::align_split::run(
                    model,
                    &groups,
                    &cfg.align_split,
                    log.reborrow(),
                )?)
            }
            Stage::SplitByNodes => StageOutcome::SplitByNodes(modify::split_by_nodes::run(
                model,
                &cfg.split_by_nodes,
                log.reborrow(),
            )?),
            Stage::IntersectionSplit => StageOutcome::IntersectionSplit(
                modify::intersection_split::run(model, &cfg.intersection_split, log.reborrow())?,
            ),
            Stage::DuplicateMerge => {
                let groups = inspect::find_duplicate_groups(model);
                StageOutcome::DuplicateMerge(modify::duplicate_merge::run(
                    model,
                    &groups,
                    &cfg.duplicate_merge,
                    log.reborrow(),
                )?)
            }
            Stage::Extension => StageOutcome::Extension(modify::extend::run(
                model,
                &cfg.extension,
                log.reborrow(),
            )?),
            Stage::MeshRefinement => StageOutcome::Refinement(modify::refinement::run(
                model,
                &cfg.refinement,
                log.reborrow(),
            )?),
        })
    }

    fn cleanup_after(&self, stage: Stage, model: &mut FeModel, log: &mut LogSink<'_>) -> Result<CleanupReport> {
        let cfg = &self.config;
        let mut report = CleanupReport::default();

        if matches!(stage, Stage::IntersectionSplit | Stage::Extension)
            && let Some(tol) = cfg.collapse_tol
        {
            report.absorb(modify::collapse_short_elements(model, tol, log.reborrow())?);
        }
        if stage == Stage::IntersectionSplit
            && let Some(len) = cfg.dangling_len
        {
            report.absorb(modify::remove_dangling_short_elements(model, len, log.reborrow())?);
        }
        if cfg.sweep_orphans {
            report.absorb(modify::sweep_orphan_nodes(model, &BTreeSet::new())?);
        }
        Ok(report)
    }
}
