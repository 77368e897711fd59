//! Passes that rewrite the model in place.
//!
//! Every pass snapshots the ids it visits before touching the stores and
//! honours `dry_run` by detecting without mutating.

pub mod align_split;
pub mod chain;
pub mod cleanup;
pub mod duplicate_merge;
pub mod extend;
pub mod intersection_split;
pub mod refinement;
pub mod split_by_nodes;

pub use align_split::{AlignSplitOptions, AlignSplitReport, ReferenceLine};
pub use cleanup::{
    CleanupReport, collapse_short_elements, remove_dangling_short_elements,
    remove_zero_length_elements, sweep_orphan_nodes,
};
pub use duplicate_merge::{AuditRowKind, DuplicateMergeOptions, DuplicateMergeReport, MergeAuditRow};
pub use extend::{ExtendOptions, ExtendReport, Extension};
pub use intersection_split::{IntersectionSplitOptions, IntersectionSplitReport};
pub use refinement::{RefinementOptions, RefinementReport};
pub use split_by_nodes::{SplitByNodesOptions, SplitByNodesReport};
