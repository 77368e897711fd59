//! Topology inspection and repair for structural line meshes.
//!
//! This crate provides:
//! - **Geometry primitives**: projections, boxes, closest approach of segments, ray casts
//! - **Spatial hash** bounding candidate pairs for every geometric search
//! - **Inspectors**: collinear/overlap groups, duplicates, connectivity, integrity, sanity
//! - **Modifiers**: align-split, duplicate merge, intersection split,
//!   split at existing nodes, refinement, free-end extension, cleanup
//! - **Pipeline** running the modifiers as ordered stages over one [`ftk_model::FeModel`]
//!
//! Passes accept an optional line sink (`Option<&mut dyn FnMut(&str)>`);
//! without one their progress goes to `tracing`.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod error;
pub mod geometry;
pub mod inspect;
pub mod log;
pub mod modify;
pub mod pipeline;
pub mod spatial_hash;
pub mod tolerance;
pub mod union_find;

pub use error::{RepairError, Result};
pub use geometry::Aabb;
pub use inspect::{Check, CollinearOptions, SanityOptions, SanityReport, Verdict};
pub use log::{LogFn, LogSink};
pub use modify::{
    AlignSplitOptions, AlignSplitReport, CleanupReport, DuplicateMergeOptions,
    DuplicateMergeReport, ExtendOptions, ExtendReport, IntersectionSplitOptions,
    IntersectionSplitReport, MergeAuditRow, RefinementOptions, RefinementReport,
    SplitByNodesOptions, SplitByNodesReport,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport, Stage, StageOutcome, StageReport};
pub use spatial_hash::SpatialHash;
pub use union_find::UnionFind;
