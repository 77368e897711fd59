//! Read-only analyses over the current model state.

pub mod collinear;
pub mod connectivity;
pub mod duplicate;
pub mod integrity;
pub mod overlap;
pub mod sanity;

pub use collinear::{CollinearOptions, find_collinear_groups};
pub use connectivity::{
    connected_element_groups, free_end_nodes, isolated_elements, node_degree, orphan_nodes,
};
pub use duplicate::find_duplicate_groups;
pub use integrity::{find_coincident_nodes, find_invalid_references, find_short_elements};
pub use overlap::{find_overlap_groups, find_overlaps, overlap_tolerance};
pub use sanity::{Check, SanityOptions, SanityReport, Verdict};
