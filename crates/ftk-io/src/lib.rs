//! File collaborators around the ftk core.
//!
//! This crate provides:
//! - **Deck loader**: keyword deck (`*MATERIAL`, `*PROPERTY`, `*NODE`, `*ELEMENT`) into an [`ftk_model::FeModel`]
//! - **Snapshots**: id-preserving JSON save/load of a whole model
//! - **Audit export**: CSV of the duplicate-merge audit trail

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod audit;
pub mod error;
pub mod loader;
pub mod snapshot;

pub use audit::{write_merge_audit, write_merge_audit_csv};
pub use error::{IoError, Result};
pub use loader::{load_deck, load_deck_file, load_deck_str};
pub use snapshot::{ModelSnapshot, SNAPSHOT_SCHEMA_VERSION, load_snapshot, save_snapshot};

use std::path::Path;

use ftk_model::FeModel;

/// Loads `.json` files as snapshots and anything else as a keyword deck.
pub fn load_model(path: impl AsRef<Path>) -> Result<FeModel> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        load_snapshot(path)
    } else {
        load_deck_file(path)
    }
}
