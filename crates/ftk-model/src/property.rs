//! Beam section properties.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::registry::ContentKeyed;
use crate::section::{PlateSection, SectionValues};

/// Section family of a property. Each variant decodes its dimension list
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Built-up I section: `[H, W_bot, W_top, tf_top, tw, tf_bot]`
    #[serde(rename = "I")]
    I,
    /// Built-up T section: `[W_top, H, tf_top, tw]`
    #[serde(rename = "T")]
    T,
    /// Explicit beam values: `[A, Izz, Iyy, J]`
    #[serde(rename = "PBEAM")]
    Pbeam,
    /// Beam values produced by merging duplicate members
    #[serde(rename = "EQUIV_PBEAM")]
    EquivPbeam,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::I => "I",
            PropertyKind::T => "T",
            PropertyKind::Pbeam => "PBEAM",
            PropertyKind::EquivPbeam => "EQUIV_PBEAM",
        }
    }

    /// Whether the dimension list already holds `[A, Izz, Iyy, J]`.
    pub fn is_explicit(&self) -> bool {
        matches!(self, PropertyKind::Pbeam | PropertyKind::EquivPbeam)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" => Ok(PropertyKind::I),
            "T" => Ok(PropertyKind::T),
            "PBEAM" => Ok(PropertyKind::Pbeam),
            "EQUIV_PBEAM" => Ok(PropertyKind::EquivPbeam),
            _ => Err(ModelError::UnknownPropertyType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PropertyFields", into = "PropertyFields")]
pub struct Property {
    kind: PropertyKind,
    dims: Vec<f64>,
    material_id: i32,
}

#[derive(Serialize, Deserialize)]
struct PropertyFields {
    kind: PropertyKind,
    dims: Vec<f64>,
    material_id: i32,
}

impl TryFrom<PropertyFields> for Property {
    type Error = ModelError;

    fn try_from(f: PropertyFields) -> Result<Self> {
        Property::new(f.kind, f.dims, f.material_id)
    }
}

impl From<Property> for PropertyFields {
    fn from(p: Property) -> Self {
        Self {
            kind: p.kind,
            dims: p.dims,
            material_id: p.material_id,
        }
    }
}

impl Property {
    pub fn new(kind: PropertyKind, dims: Vec<f64>, material_id: i32) -> Result<Self> {
        if dims.is_empty() {
            return Err(ModelError::MalformedProperty {
                reason: format!("{kind} property has no dimensions"),
            });
        }
        if let Some(bad) = dims.iter().find(|d| !d.is_finite()) {
            return Err(ModelError::MalformedProperty {
                reason: format!("{kind} property has non-finite dimension {bad}"),
            });
        }
        Ok(Self {
            kind,
            dims,
            material_id,
        })
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn dims(&self) -> &[f64] {
        &self.dims
    }

    pub fn material_id(&self) -> i32 {
        self.material_id
    }

    /// `[A, Izz, Iyy, J]` of this section.
    ///
    /// Explicit kinds read the first four slots (missing slots are zero).
    /// Plate kinds go through [`PlateSection`]; `None` when too few
    /// dimensions are given to describe the plates.
    pub fn section(&self) -> Option<SectionValues> {
        match self.kind {
            PropertyKind::Pbeam | PropertyKind::EquivPbeam => {
                let slot = |i: usize| self.dims.get(i).copied().unwrap_or(0.0);
                Some(SectionValues {
                    area: slot(0),
                    izz: slot(1),
                    iyy: slot(2),
                    torsion: slot(3),
                })
            }
            PropertyKind::I => PlateSection::from_i_dims(&self.dims).map(|s| s.properties().values()),
            PropertyKind::T => PlateSection::from_t_dims(&self.dims).map(|s| s.properties().values()),
        }
    }

    /// Representative section size used to scale search radii.
    pub fn reference_dimension(&self) -> f64 {
        match self.kind {
            PropertyKind::I | PropertyKind::T if self.dims.len() > 2 => {
                (self.dims[2] / 2.0 * 10.0).round() / 10.0
            }
            _ => self.dims.iter().copied().fold(0.0, f64::max),
        }
    }
}

impl ContentKeyed for Property {
    fn content_key(&self) -> String {
        let dims: Vec<String> = self.dims.iter().map(|d| format!("{:x}", d.to_bits())).collect();
        format!("{}|{}|{}", self.kind, dims.join(","), self.material_id)
    }

    fn not_found(id: i32) -> ModelError {
        ModelError::PropertyNotFound(id)
    }
}

pub type PropertyStore = crate::registry::DedupStore<Property>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [
            PropertyKind::I,
            PropertyKind::T,
            PropertyKind::Pbeam,
            PropertyKind::EquivPbeam,
        ] {
            assert_eq!(kind.as_str().parse::<PropertyKind>().unwrap(), kind);
        }
        assert_eq!("pbeam".parse::<PropertyKind>().unwrap(), PropertyKind::Pbeam);
        assert!(matches!(
            "L".parse::<PropertyKind>(),
            Err(ModelError::UnknownPropertyType(_))
        ));
    }

    #[test]
    fn empty_dims_are_malformed() {
        assert!(matches!(
            Property::new(PropertyKind::Pbeam, vec![], 1),
            Err(ModelError::MalformedProperty { .. })
        ));
    }

    #[test]
    fn explicit_section_pads_missing_slots() {
        let p = Property::new(PropertyKind::Pbeam, vec![100.0, 2000.0], 1).unwrap();
        let s = p.section().unwrap();
        assert_eq!(s.as_dims(), vec![100.0, 2000.0, 0.0, 0.0]);
    }

    #[test]
    fn plate_sections_need_enough_dims() {
        let short = Property::new(PropertyKind::I, vec![300.0, 150.0], 1).unwrap();
        assert!(short.section().is_none());
        let t = Property::new(PropertyKind::T, vec![750.0, 200.0, 12.0, 10.0], 1).unwrap();
        assert!(t.section().unwrap().area > 0.0);
    }

    #[test]
    fn reference_dimension_per_kind() {
        let i = Property::new(PropertyKind::I, vec![400.0, 150.0, 750.0, 12.0, 8.0, 15.0], 1).unwrap();
        assert_eq!(i.reference_dimension(), 375.0);
        let p = Property::new(PropertyKind::Pbeam, vec![10.0, 50.0, 3.0], 1).unwrap();
        assert_eq!(p.reference_dimension(), 50.0);
    }
}
