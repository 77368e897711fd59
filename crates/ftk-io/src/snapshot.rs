use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ftk_model::{Element, FeModel, Material, Point3, Property};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Id-keyed JSON image of a whole model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSnapshot {
    pub schema_version: u32,
    pub nodes: BTreeMap<i32, Point3<f64>>,
    pub elements: BTreeMap<i32, Element>,
    pub properties: BTreeMap<i32, Property>,
    pub materials: BTreeMap<i32, Material>,
}

impl Default for ModelSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            nodes: BTreeMap::new(),
            elements: BTreeMap::new(),
            properties: BTreeMap::new(),
            materials: BTreeMap::new(),
        }
    }
}

impl ModelSnapshot {
    pub fn capture(model: &FeModel) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            nodes: model.nodes.iter().map(|(id, p)| (id, *p)).collect(),
            elements: model.elements.iter().map(|(id, e)| (id, e.clone())).collect(),
            properties: model.properties.iter().map(|(id, p)| (id, p.clone())).collect(),
            materials: model.materials.iter().map(|(id, m)| (id, m.clone())).collect(),
        }
    }

    /// Rebuilds the registries with the recorded ids.
    pub fn restore(self) -> FeModel {
        let mut model = FeModel::new();
        for (id, material) in self.materials {
            model.materials.add_with_id(id, material);
        }
        for (id, property) in self.properties {
            model.properties.add_with_id(id, property);
        }
        for (id, p) in self.nodes {
            model.nodes.add_with_id(id, p);
        }
        for (id, element) in self.elements {
            model.elements.add_with_id(id, element);
        }
        model
    }
}

pub fn save_snapshot(path: impl AsRef<Path>, model: &FeModel) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(&ModelSnapshot::capture(model))?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<FeModel> {
    let bytes = fs::read(path)?;
    let snapshot: ModelSnapshot = serde_json::from_slice(&bytes)?;
    Ok(snapshot.restore())
}
