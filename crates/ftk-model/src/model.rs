//! The shared model context handed from stage to stage.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
use serde::Serialize;

use crate::element::ElementStore;
use crate::error::Result;
use crate::material::MaterialStore;
use crate::node::NodeStore;
use crate::property::PropertyStore;

/// Nodes, elements, properties and materials of one structural model.
///
/// Every repair pass takes this by `&mut` and mutates it in place.
#[derive(Debug, Clone, Default)]
pub struct FeModel {
    pub nodes: NodeStore,
    pub elements: ElementStore,
    pub properties: PropertyStore,
    pub materials: MaterialStore,
}

/// Straight segment between an element's endpoint nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub element_id: i32,
    pub start_id: i32,
    pub end_id: i32,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl Segment {
    pub fn vector(&self) -> Vector3<f64> {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    pub fn midpoint(&self) -> Point3<f64> {
        nalgebra::center(&self.start, &self.end)
    }

    /// Point at parameter `t` (0 at start, 1 at end).
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.start + self.vector() * t
    }
}

/// Broken reference found by [`FeModel::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityIssue {
    MissingNode { element: i32, node: i32 },
    MissingProperty { element: i32, property: i32 },
    MissingMaterial { property: i32, material: i32 },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::MissingNode { element, node } => {
                write!(f, "element {element} references missing node {node}")
            }
            IntegrityIssue::MissingProperty { element, property } => {
                write!(f, "element {element} references missing property {property}")
            }
            IntegrityIssue::MissingMaterial { property, material } => {
                write!(f, "property {property} references missing material {material}")
            }
        }
    }
}

impl FeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint geometry of element `id`.
    pub fn segment(&self, id: i32) -> Result<Segment> {
        let (start_id, end_id) = self.elements.get(id)?.endpoints();
        Ok(Segment {
            element_id: id,
            start_id,
            end_id,
            start: self.nodes.get(start_id)?,
            end: self.nodes.get(end_id)?,
        })
    }

    pub fn element_length(&self, id: i32) -> Result<f64> {
        Ok(self.segment(id)?.length())
    }

    /// Every broken node, property or material reference, in id order.
    /// Nothing is repaired.
    pub fn validate(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for (eid, element) in self.elements.iter() {
            for &node in element.node_ids() {
                if !self.nodes.contains(node) {
                    issues.push(IntegrityIssue::MissingNode { element: eid, node });
                }
            }
            if !self.properties.contains(element.property_id()) {
                issues.push(IntegrityIssue::MissingProperty {
                    element: eid,
                    property: element.property_id(),
                });
            }
        }
        for (pid, property) in self.properties.iter() {
            if !self.materials.contains(property.material_id()) {
                issues.push(IntegrityIssue::MissingMaterial {
                    property: pid,
                    material: property.material_id(),
                });
            }
        }
        issues
    }

    pub fn statistics(&self) -> ModelStatistics {
        let mut elements_by_kind = BTreeMap::new();
        let mut lengths = Vec::with_capacity(self.elements.len());

        for (eid, element) in self.elements.iter() {
            let kind = self
                .properties
                .get(element.property_id())
                .map(|p| p.kind().to_string())
                .unwrap_or_else(|_| "unresolved".to_string());
            *elements_by_kind.entry(kind).or_insert(0) += 1;
            if let Ok(len) = self.element_length(eid) {
                lengths.push(len);
            }
        }

        ModelStatistics {
            num_nodes: self.nodes.len(),
            num_elements: self.elements.len(),
            num_properties: self.properties.len(),
            num_materials: self.materials.len(),
            elements_by_kind,
            total_length: lengths.iter().sum(),
            shortest_element: lengths.iter().copied().reduce(f64::min),
            longest_element: lengths.iter().copied().reduce(f64::max),
            model_size: self.nodes.model_size(),
        }
    }
}

/// Model statistics for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatistics {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub num_properties: usize,
    pub num_materials: usize,
    /// Element count per property kind
    pub elements_by_kind: BTreeMap<String, usize>,
    pub total_length: f64,
    pub shortest_element: Option<f64>,
    pub longest_element: Option<f64>,
    /// Bounding-box diagonal of all nodes
    pub model_size: f64,
}

impl ModelStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("Nodes: {}", self.num_nodes),
            format!("Elements: {}", self.num_elements),
            format!("Properties: {}", self.num_properties),
            format!("Materials: {}", self.num_materials),
            format!("Total length: {:.3}", self.total_length),
            format!("Model size: {:.3}", self.model_size),
        ];
        if let (Some(lo), Some(hi)) = (self.shortest_element, self.longest_element) {
            lines.push(format!("Element length: {lo:.3} .. {hi:.3}"));
        }
        if !self.elements_by_kind.is_empty() {
            lines.push("Elements by property type:".to_string());
            for (kind, count) in &self.elements_by_kind {
                lines.push(format!("  {kind}: {count}"));
            }
        }
        lines.join("\n")
    }
}
