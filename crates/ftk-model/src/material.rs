//! Linear elastic materials.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::registry::ContentKeyed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Young's modulus
    pub elastic_modulus: f64,
    pub poissons_ratio: f64,
    pub density: f64,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        elastic_modulus: f64,
        poissons_ratio: f64,
        density: f64,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::MalformedMaterial {
                reason: "material name is empty".to_string(),
            });
        }
        Ok(Self {
            name,
            elastic_modulus,
            poissons_ratio,
            density,
        })
    }

    /// Shear modulus G = E / (2(1 + ν)), or 0 when ν = -1.
    pub fn shear_modulus(&self) -> f64 {
        let denom = 2.0 * (1.0 + self.poissons_ratio);
        if denom.abs() < f64::EPSILON {
            0.0
        } else {
            self.elastic_modulus / denom
        }
    }
}

impl ContentKeyed for Material {
    fn content_key(&self) -> String {
        format!(
            "{}|{:x}|{:x}|{:x}",
            self.name,
            self.elastic_modulus.to_bits(),
            self.poissons_ratio.to_bits(),
            self.density.to_bits()
        )
    }

    fn not_found(id: i32) -> ModelError {
        ModelError::MaterialNotFound(id)
    }
}

pub type MaterialStore = crate::registry::DedupStore<Material>;
