//! Chain-and-rebuild: cutting one element into consecutive sub-segments.

use std::collections::BTreeSet;

use ftk_model::FeModel;

use crate::error::Result;

/// How a split element was rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rebuilt {
    /// Segments kept after length filtering
    pub segments: usize,
    /// The original id now holds the first segment
    pub reused_id: bool,
    /// Ids assigned to the remaining segments
    pub added: Vec<i32>,
    /// Nothing survived and the element was deleted
    pub removed: bool,
}

/// Start node, interior nodes in order, end node.
///
/// Interior ids equal to either endpoint are skipped and consecutive repeats
/// collapse to one entry.
pub fn build_chain(start: i32, interior: &[i32], end: i32) -> Vec<i32> {
    let mut chain = Vec::with_capacity(interior.len() + 2);
    chain.push(start);
    for &nid in interior {
        if nid != start && nid != end {
            chain.push(nid);
        }
    }
    chain.push(end);
    chain.dedup();
    chain
}

/// Replaces element `eid` by one two-node element per consecutive chain pair.
///
/// Pairs closer than `min_seg_len` (or repeating a node) are dropped. Every
/// new segment copies the original property and metadata. With
/// `reuse_first` the first segment keeps `eid`, otherwise `eid` is deleted
/// and all segments get fresh ids.
pub fn rebuild_element(
    model: &mut FeModel,
    eid: i32,
    chain: &[i32],
    min_seg_len: f64,
    reuse_first: bool,
) -> Result<Rebuilt> {
    let original = model.elements.get(eid)?.clone();

    let mut pieces = Vec::new();
    for pair in chain.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a == b {
            continue;
        }
        let len = (model.nodes.get(b)? - model.nodes.get(a)?).norm();
        if len < min_seg_len {
            continue;
        }
        pieces.push(original.with_node_ids(vec![a, b])?);
    }

    let mut out = Rebuilt {
        segments: pieces.len(),
        ..Default::default()
    };
    if pieces.is_empty() {
        model.elements.remove(eid)?;
        out.removed = true;
        return Ok(out);
    }

    let mut pieces = pieces.into_iter();
    if reuse_first && let Some(first) = pieces.next() {
        model.elements.replace(eid, first)?;
        out.reused_id = true;
    }
    for piece in pieces {
        out.added.push(model.elements.add_new(piece));
    }
    // removed last so the freed id is never handed to a piece
    if !out.reused_id {
        model.elements.remove(eid)?;
    }
    Ok(out)
}

/// Deletes elements on any of the `moved` nodes that are now shorter than
/// `min_len`, leaving ids in `skip` alone. Returns the deleted ids.
pub fn remove_collapsed(
    model: &mut FeModel,
    moved: &BTreeSet<i32>,
    skip: &BTreeSet<i32>,
    min_len: f64,
) -> Result<Vec<i32>> {
    let mut touched = BTreeSet::new();
    for &nid in moved {
        touched.extend(model.elements.elements_using(nid));
    }
    let mut removed = Vec::new();
    for eid in touched {
        if skip.contains(&eid) {
            continue;
        }
        if let Ok(len) = model.element_length(eid)
            && len < min_len
        {
            model.elements.remove(eid)?;
            removed.push(eid);
        }
    }
    Ok(removed)
}
