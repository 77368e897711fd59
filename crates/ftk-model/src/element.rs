//! Line elements and their registry.
//!
//! An [`Element`] is immutable once built: every change goes through a
//! derivation helper that returns a new value, and the registry swaps values
//! with [`ElementStore::replace`]. Geometric code treats every element as one
//! straight segment between its first and last node id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Metadata key recording which element ids were merged into an element.
pub const MERGED_FROM: &str = "MergedFrom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementFields", into = "ElementFields")]
pub struct Element {
    node_ids: Vec<i32>,
    property_id: i32,
    extra: BTreeMap<String, String>,
}

/// Unvalidated wire form.
#[derive(Serialize, Deserialize)]
struct ElementFields {
    node_ids: Vec<i32>,
    property_id: i32,
    #[serde(default)]
    extra: BTreeMap<String, String>,
}

impl TryFrom<ElementFields> for Element {
    type Error = ModelError;

    fn try_from(f: ElementFields) -> Result<Self> {
        Element::new(f.node_ids, f.property_id, f.extra)
    }
}

impl From<Element> for ElementFields {
    fn from(e: Element) -> Self {
        Self {
            node_ids: e.node_ids,
            property_id: e.property_id,
            extra: e.extra,
        }
    }
}

impl Element {
    /// Builds an element, rejecting fewer than two or repeated node ids.
    pub fn new(
        node_ids: Vec<i32>,
        property_id: i32,
        extra: BTreeMap<String, String>,
    ) -> Result<Self> {
        if node_ids.len() < 2 {
            return Err(ModelError::MalformedElement {
                reason: format!("needs at least 2 node ids, got {}", node_ids.len()),
            });
        }
        for (i, id) in node_ids.iter().enumerate() {
            if node_ids[..i].contains(id) {
                return Err(ModelError::MalformedElement {
                    reason: format!("node id {id} appears more than once"),
                });
            }
        }
        Ok(Self {
            node_ids,
            property_id,
            extra,
        })
    }

    /// Two-node element without metadata.
    pub fn line(n1: i32, n2: i32, property_id: i32) -> Result<Self> {
        Self::new(vec![n1, n2], property_id, BTreeMap::new())
    }

    pub fn node_ids(&self) -> &[i32] {
        &self.node_ids
    }

    pub fn property_id(&self) -> i32 {
        self.property_id
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// `(first, last)` node ids.
    pub fn endpoints(&self) -> (i32, i32) {
        // length >= 2 is a construction invariant
        (self.node_ids[0], self.node_ids[self.node_ids.len() - 1])
    }

    pub fn uses_node(&self, node_id: i32) -> bool {
        self.node_ids.contains(&node_id)
    }

    /// Same property and metadata on a different node list.
    pub fn with_node_ids(&self, node_ids: Vec<i32>) -> Result<Self> {
        Self::new(node_ids, self.property_id, self.extra.clone())
    }

    pub fn with_property(&self, property_id: i32) -> Self {
        Self {
            property_id,
            ..self.clone()
        }
    }

    pub fn with_extra_entry(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.extra.insert(key.into(), value.into());
        out
    }

    /// Replaces `old` with `new`. `None` when `old` is not used or the result
    /// would repeat a node id.
    pub fn try_replace_node(&self, old: i32, new: i32) -> Option<Self> {
        if !self.uses_node(old) {
            return None;
        }
        let ids = self
            .node_ids
            .iter()
            .map(|&id| if id == old { new } else { id })
            .collect();
        self.with_node_ids(ids).ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: BTreeMap<i32, Element>,
    last_id: i32,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `element` under the next unused id.
    pub fn add_new(&mut self, element: Element) -> i32 {
        let id = self.last_id + 1;
        self.add_with_id(id, element);
        id
    }

    /// Installs or overwrites the element at `id`.
    pub fn add_with_id(&mut self, id: i32, element: Element) {
        self.elements.insert(id, element);
        self.last_id = self.last_id.max(id);
    }

    /// Swaps the element stored at an existing id, returning the old value.
    pub fn replace(&mut self, id: i32, element: Element) -> Result<Element> {
        let slot = self
            .elements
            .get_mut(&id)
            .ok_or(ModelError::ElementNotFound(id))?;
        Ok(std::mem::replace(slot, element))
    }

    pub fn remove(&mut self, id: i32) -> Result<Element> {
        let element = self
            .elements
            .remove(&id)
            .ok_or(ModelError::ElementNotFound(id))?;
        if id == self.last_id {
            self.last_id = self.elements.keys().next_back().copied().unwrap_or(0);
        }
        Ok(element)
    }

    pub fn get(&self, id: i32) -> Result<&Element> {
        self.elements.get(&id).ok_or(ModelError::ElementNotFound(id))
    }

    pub fn contains(&self, id: i32) -> bool {
        self.elements.contains_key(&id)
    }

    /// Snapshot of all ids in ascending order.
    pub fn ids(&self) -> Vec<i32> {
        self.elements.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &Element)> {
        self.elements.iter().map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn last_id(&self) -> i32 {
        self.last_id
    }

    /// Number of elements referencing `node_id`.
    pub fn count_node_usage(&self, node_id: i32) -> usize {
        self.elements.values().filter(|e| e.uses_node(node_id)).count()
    }

    /// Usage count for every referenced node id.
    pub fn node_usage(&self) -> BTreeMap<i32, usize> {
        let mut usage = BTreeMap::new();
        for element in self.elements.values() {
            for id in element.node_ids() {
                *usage.entry(*id).or_insert(0) += 1;
            }
        }
        usage
    }

    pub fn elements_using(&self, node_id: i32) -> Vec<i32> {
        self.iter()
            .filter(|(_, e)| e.uses_node(node_id))
            .map(|(id, _)| id)
            .collect()
    }
}
