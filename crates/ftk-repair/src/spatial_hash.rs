//! Uniform grid index over element or node bounding boxes.
//!
//! Every inserted box is rasterised into the integer cells it overlaps.
//! [`SpatialHash::query`] returns every id sharing a cell with the query box,
//! so results are a superset of the true overlaps and callers must still run
//! their exact geometric test.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ftk_model::FeModel;
use nalgebra::Point3;

use crate::geometry::Aabb;

/// Smallest usable cell edge.
pub const MIN_CELL_SIZE: f64 = 1e-9;

type CellKey = (i64, i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell: f64,
    cells: HashMap<CellKey, Vec<i32>>,
    boxes: BTreeMap<i32, Aabb>,
}

impl SpatialHash {
    /// Empty grid. Non-positive or NaN cell sizes are clamped to [`MIN_CELL_SIZE`].
    pub fn new(cell_size: f64) -> Self {
        let cell = if cell_size > MIN_CELL_SIZE {
            cell_size
        } else {
            MIN_CELL_SIZE
        };
        Self {
            cell,
            cells: HashMap::new(),
            boxes: BTreeMap::new(),
        }
    }

    /// Indexes every element whose endpoints resolve, with its segment box
    /// grown by `inflate` (negative values count as 0).
    pub fn for_elements(model: &FeModel, cell_size: f64, inflate: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for eid in model.elements.ids() {
            if let Ok(seg) = model.segment(eid) {
                grid.insert(eid, Aabb::from_segment(&seg.start, &seg.end, inflate));
            }
        }
        grid
    }

    /// Indexes every node as a point box.
    pub fn for_nodes(model: &FeModel, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (id, p) in model.nodes.iter() {
            grid.insert(id, Aabb::from_point(p, 0.0));
        }
        grid
    }

    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    pub fn insert(&mut self, id: i32, bbox: Aabb) {
        let (lo, hi) = self.cell_range(&bbox);
        for ix in lo.0..=hi.0 {
            for iy in lo.1..=hi.1 {
                for iz in lo.2..=hi.2 {
                    self.cells.entry((ix, iy, iz)).or_default().push(id);
                }
            }
        }
        self.boxes.insert(id, bbox);
    }

    /// Ids stored in any cell overlapped by `bbox`, ascending.
    pub fn query(&self, bbox: &Aabb) -> BTreeSet<i32> {
        let (lo, hi) = self.cell_range(bbox);
        let span = |a: i64, b: i64| (b - a + 1) as u128;
        let covered = span(lo.0, hi.0) * span(lo.1, hi.1) * span(lo.2, hi.2);

        let mut out = BTreeSet::new();
        if covered > self.cells.len() as u128 {
            // cheaper to scan occupied cells than to walk the query range
            for (key, ids) in &self.cells {
                let inside = (lo.0..=hi.0).contains(&key.0)
                    && (lo.1..=hi.1).contains(&key.1)
                    && (lo.2..=hi.2).contains(&key.2);
                if inside {
                    out.extend(ids.iter().copied());
                }
            }
            return out;
        }

        for ix in lo.0..=hi.0 {
            for iy in lo.1..=hi.1 {
                for iz in lo.2..=hi.2 {
                    if let Some(ids) = self.cells.get(&(ix, iy, iz)) {
                        out.extend(ids.iter().copied());
                    }
                }
            }
        }
        out
    }

    /// Candidates around an indexed id's own box. Includes `id` itself.
    pub fn query_id(&self, id: i32) -> BTreeSet<i32> {
        self.boxes
            .get(&id)
            .map(|bb| self.query(bb))
            .unwrap_or_default()
    }

    pub fn bbox(&self, id: i32) -> Option<&Aabb> {
        self.boxes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    fn key(&self, p: &Point3<f64>) -> CellKey {
        (
            (p.x / self.cell).floor() as i64,
            (p.y / self.cell).floor() as i64,
            (p.z / self.cell).floor() as i64,
        )
    }

    fn cell_range(&self, bbox: &Aabb) -> (CellKey, CellKey) {
        let a = self.key(&bbox.min);
        let b = self.key(&bbox.max);
        (
            (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2)),
            (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2)),
        )
    }
}
