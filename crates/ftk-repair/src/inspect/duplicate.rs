//! Elements sharing an identical node set.

use std::collections::BTreeMap;

use ftk_model::FeModel;

/// Groups of two or more elements whose sorted node-id lists are equal.
/// Members are ascending; groups are ordered by their node key.
pub fn find_duplicate_groups(model: &FeModel) -> Vec<Vec<i32>> {
    let mut by_nodes: BTreeMap<Vec<i32>, Vec<i32>> = BTreeMap::new();
    for (eid, element) in model.elements.iter() {
        let mut key = element.node_ids().to_vec();
        key.sort_unstable();
        by_nodes.entry(key).or_default().push(eid);
    }
    by_nodes.into_values().filter(|g| g.len() > 1).collect()
}
