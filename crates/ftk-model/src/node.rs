//! Coordinate-keyed node registry.
//!
//! Nodes are stored with their exact coordinates. A secondary lookup keyed by
//! the coordinate rounded to one decimal place lets [`NodeStore::add_or_get`]
//! reuse an existing node instead of creating a near-duplicate. Several ids may
//! share one rounded key when they were installed through
//! [`NodeStore::add_with_id`] or [`NodeStore::allocate`]; lookups then return the
//! whole set and callers pick the minimum id.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use nalgebra::{Point3, Vector3};

use crate::error::{ModelError, Result};

/// Scale applied before rounding: one decimal place.
const KEY_SCALE: f64 = 10.0;

/// Rounded coordinate used as the spatial lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey(i64, i64, i64);

impl CoordKey {
    pub fn of(p: &Point3<f64>) -> Self {
        // f64::round rounds half away from zero
        Self(
            (p.x * KEY_SCALE).round() as i64,
            (p.y * KEY_SCALE).round() as i64,
            (p.z * KEY_SCALE).round() as i64,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    points: BTreeMap<i32, Point3<f64>>,
    lookup: HashMap<CoordKey, BTreeSet<i32>>,
    last_id: i32,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical (minimum) id at the rounded coordinate of `p`,
    /// creating a node at the next id when none exists.
    pub fn add_or_get(&mut self, p: Point3<f64>) -> i32 {
        if let Some(id) = self.find_ids(&p).first() {
            return *id;
        }
        self.allocate(p)
    }

    /// Creates a node at the next id even if the rounded key is taken.
    pub fn allocate(&mut self, p: Point3<f64>) -> i32 {
        let id = self.next_id();
        self.add_with_id(id, p);
        id
    }

    /// Installs or overwrites the node at `id`.
    pub fn add_with_id(&mut self, id: i32, p: Point3<f64>) {
        if let Some(old) = self.points.insert(id, p) {
            self.unlink(id, &old);
        }
        self.lookup.entry(CoordKey::of(&p)).or_default().insert(id);
        self.last_id = self.last_id.max(id);
    }

    /// Moves an existing node.
    pub fn set_position(&mut self, id: i32, p: Point3<f64>) -> Result<()> {
        if !self.points.contains_key(&id) {
            return Err(ModelError::NodeNotFound(id));
        }
        self.add_with_id(id, p);
        Ok(())
    }

    pub fn remove(&mut self, id: i32) -> Result<Point3<f64>> {
        let p = self
            .points
            .remove(&id)
            .ok_or(ModelError::NodeNotFound(id))?;
        self.unlink(id, &p);
        if id == self.last_id {
            self.last_id = self.points.keys().next_back().copied().unwrap_or(0);
        }
        Ok(p)
    }

    fn unlink(&mut self, id: i32, p: &Point3<f64>) {
        let key = CoordKey::of(p);
        if let Some(ids) = self.lookup.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.lookup.remove(&key);
            }
        }
    }

    pub fn get(&self, id: i32) -> Result<Point3<f64>> {
        self.points
            .get(&id)
            .copied()
            .ok_or(ModelError::NodeNotFound(id))
    }

    pub fn contains(&self, id: i32) -> bool {
        self.points.contains_key(&id)
    }

    /// All ids sharing the rounded coordinate of `p`, ascending.
    pub fn find_ids(&self, p: &Point3<f64>) -> Vec<i32> {
        self.lookup
            .get(&CoordKey::of(p))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Nearest node by true distance; ties go to the smaller id.
    pub fn find_closest(&self, p: &Point3<f64>) -> Option<i32> {
        let mut best: Option<(i32, f64)> = None;
        for (id, q) in &self.points {
            let d = (q - p).norm_squared();
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((*id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Node at `origin + direction * t`, deduplicated through [`Self::add_or_get`].
    pub fn get_or_create_at(
        &mut self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        t: f64,
    ) -> i32 {
        self.add_or_get(origin + direction * t)
    }

    /// Snapshot of all ids in ascending order.
    pub fn ids(&self) -> Vec<i32> {
        self.points.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &Point3<f64>)> {
        self.points.iter().map(|(id, p)| (*id, p))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_id(&self) -> i32 {
        self.last_id
    }

    pub fn next_id(&self) -> i32 {
        self.last_id + 1
    }

    /// Axis-aligned bounds of all nodes.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut it = self.points.values();
        let first = *it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p))))
    }

    /// Length of the bounding-box diagonal, 0 for an empty store.
    pub fn model_size(&self) -> f64 {
        self.bounds().map(|(lo, hi)| (hi - lo).norm()).unwrap_or(0.0)
    }
}
