//! Node degree and element connectivity.

use std::collections::BTreeMap;

use ftk_model::FeModel;

use crate::union_find::UnionFind;

/// Number of elements using each stored node, including unused nodes at 0.
pub fn node_degree(model: &FeModel) -> BTreeMap<i32, usize> {
    let mut degree: BTreeMap<i32, usize> = model.nodes.ids().into_iter().map(|id| (id, 0)).collect();
    for (_, element) in model.elements.iter() {
        for id in element.node_ids() {
            if let Some(d) = degree.get_mut(id) {
                *d += 1;
            }
        }
    }
    degree
}

/// Nodes used by exactly one element.
pub fn free_end_nodes(model: &FeModel) -> Vec<i32> {
    nodes_with_degree(model, 1)
}

/// Nodes used by no element.
pub fn orphan_nodes(model: &FeModel) -> Vec<i32> {
    nodes_with_degree(model, 0)
}

fn nodes_with_degree(model: &FeModel, wanted: usize) -> Vec<i32> {
    node_degree(model)
        .into_iter()
        .filter(|&(_, d)| d == wanted)
        .map(|(id, _)| id)
        .collect()
}

/// Elements joined through shared nodes, one group per connected piece.
pub fn connected_element_groups(model: &FeModel) -> Vec<Vec<i32>> {
    let mut uf = UnionFind::with_ids(model.elements.ids());
    let mut first_user: BTreeMap<i32, i32> = BTreeMap::new();
    for (eid, element) in model.elements.iter() {
        for &nid in element.node_ids() {
            match first_user.get(&nid) {
                Some(&other) => uf.union(eid, other),
                None => {
                    first_user.insert(nid, eid);
                }
            }
        }
    }
    uf.clusters()
}

/// Elements that share no node with any other element.
pub fn isolated_elements(model: &FeModel) -> Vec<i32> {
    let usage = model.elements.node_usage();
    model
        .elements
        .iter()
        .filter(|(_, e)| e.node_ids().iter().all(|n| usage.get(n) == Some(&1)))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftk_model::{Element, Point3};

    fn model() -> FeModel {
        let mut model = FeModel::new();
        for x in 0..6 {
            model.nodes.add_with_id(x + 1, Point3::new(x as f64 * 10.0, 0.0, 0.0));
        }
        // 1-2-3 chain, 4-5 alone, node 6 unused
        model.elements.add_new(Element::line(1, 2, 1).unwrap());
        model.elements.add_new(Element::line(2, 3, 1).unwrap());
        model.elements.add_new(Element::line(4, 5, 1).unwrap());
        model
    }

    #[test]
    fn degrees_and_free_ends() {
        let m = model();
        let degree = node_degree(&m);
        assert_eq!(degree[&2], 2);
        assert_eq!(degree[&6], 0);
        assert_eq!(free_end_nodes(&m), vec![1, 3, 4, 5]);
        assert_eq!(orphan_nodes(&m), vec![6]);
    }

    #[test]
    fn connected_groups_and_isolation() {
        let m = model();
        assert_eq!(connected_element_groups(&m), vec![vec![1, 2], vec![3]]);
        assert_eq!(isolated_elements(&m), vec![3]);
    }
}
