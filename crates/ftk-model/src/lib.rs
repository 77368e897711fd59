//! Registries for structural line meshes.
//!
//! This crate provides:
//! - **Node store** with coordinate-rounded deduplication
//! - **Element store** of immutable line elements swapped by id
//! - **Property and material stores** deduplicated by content
//! - **Plate-section calculator** for built-up I and T stiffeners
//! - **`FeModel`**, the mutable context shared by repair passes

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod element;
pub mod error;
pub mod material;
pub mod model;
pub mod node;
pub mod property;
pub mod registry;
pub mod section;

pub use element::{Element, ElementStore, MERGED_FROM};
pub use error::{ModelError, Result};
pub use material::{Material, MaterialStore};
pub use model::{FeModel, IntegrityIssue, ModelStatistics, Segment};
pub use node::{CoordKey, NodeStore};
pub use property::{Property, PropertyKind, PropertyStore};
pub use registry::{ContentKeyed, DedupStore};
pub use section::{PlateSection, PlateSectionProperties, SectionValues};

pub use nalgebra::{Point3, Vector3};
