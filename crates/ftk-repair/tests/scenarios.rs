//! Scenario tests for the align-split and intersection-split passes.

use ftk_model::{Element, FeModel, Point3};
use ftk_repair::inspect::{find_duplicate_groups, find_overlap_groups};
use ftk_repair::modify::{align_split, intersection_split};
use ftk_repair::{AlignSplitOptions, CollinearOptions, IntersectionSplitOptions};

fn quiet() -> impl FnMut(&str) {
    |_: &str| {}
}

fn element_table(model: &FeModel) -> Vec<(i32, Vec<i32>)> {
    model
        .elements
        .iter()
        .map(|(id, e)| (id, e.node_ids().to_vec()))
        .collect()
}

/// Two members on the x axis whose end nodes match to within rounding but
/// carry different ids.
fn near_duplicate_pair() -> FeModel {
    let mut model = FeModel::new();
    let n1 = model.nodes.allocate(Point3::new(0.0, 0.0, 0.0));
    let n2 = model.nodes.allocate(Point3::new(100.0, 0.0, 0.0));
    let n3 = model.nodes.allocate(Point3::new(0.02, 0.0, 0.0));
    let n4 = model.nodes.allocate(Point3::new(100.03, 0.0, 0.0));
    model.elements.add_new(Element::line(n1, n2, 1).unwrap());
    model.elements.add_new(Element::line(n3, n4, 1).unwrap());
    model
}

#[test]
fn test_near_duplicates_collapse_onto_shared_nodes() {
    let mut model = near_duplicate_pair();
    let groups = find_overlap_groups(&model, &CollinearOptions::default());
    assert_eq!(groups, vec![vec![1, 2]]);

    let mut log = quiet();
    let report = align_split::run(&mut model, &groups, &AlignSplitOptions::default(), Some(&mut log)).unwrap();
    assert_eq!(report.groups_processed, 1);

    let table = element_table(&model);
    assert_eq!(table.len(), 2);
    for (_, nodes) in &table {
        assert_eq!(nodes, &vec![1, 2]);
    }
    assert_eq!(find_duplicate_groups(&model).len(), 1);
}

#[test]
fn test_align_split_is_idempotent() {
    let mut model = near_duplicate_pair();
    let opt = AlignSplitOptions::default();
    let mut log = quiet();

    let groups = find_overlap_groups(&model, &CollinearOptions::default());
    align_split::run(&mut model, &groups, &opt, Some(&mut log)).unwrap();
    let elements = element_table(&model);
    let nodes: Vec<_> = model.nodes.iter().map(|(id, p)| (id, *p)).collect();

    let groups = find_overlap_groups(&model, &CollinearOptions::default());
    assert_eq!(groups.len(), 1);
    let second = align_split::run(&mut model, &groups, &opt, Some(&mut log)).unwrap();

    assert_eq!(second.segments_created, 0);
    assert_eq!(second.nodes_snapped, 0);
    assert_eq!(second.elements_unchanged, 2);
    assert_eq!(element_table(&model), elements);
    let after: Vec<_> = model.nodes.iter().map(|(id, p)| (id, *p)).collect();
    assert_eq!(after, nodes);
}

#[test]
fn test_staggered_members_share_split_stations() {
    // three members along y, overlapping in a staircase
    let mut model = FeModel::new();
    for (a, b) in [(0.0, 60.0), (40.0, 100.0), (20.0, 80.0)] {
        let na = model.nodes.allocate(Point3::new(5.0, a, 0.0));
        let nb = model.nodes.allocate(Point3::new(5.0, b, 0.0));
        model.elements.add_new(Element::line(na, nb, 1).unwrap());
    }
    let groups = find_overlap_groups(&model, &CollinearOptions::default());
    assert_eq!(groups, vec![vec![1, 2, 3]]);

    let mut log = quiet();
    let report = align_split::run(&mut model, &groups, &AlignSplitOptions::default(), Some(&mut log)).unwrap();
    // stations 0, 20, 40, 60, 80, 100: 3 + 3 + 3 pieces
    assert_eq!(report.segments_created, 9);

    let mut ys: Vec<f64> = model.nodes.iter().map(|(_, p)| p.y).collect();
    ys.sort_by(f64::total_cmp);
    assert_eq!(ys, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    for (id, _) in model.elements.iter() {
        let len = model.element_length(id).unwrap();
        assert!((len - 20.0).abs() < 1e-9, "element {id} has length {len}");
    }
}

#[test]
fn test_plus_crossing_becomes_four_members() {
    let mut model = FeModel::new();
    let a = model.nodes.allocate(Point3::new(-50.0, 0.0, 10.0));
    let b = model.nodes.allocate(Point3::new(50.0, 0.0, 10.0));
    let c = model.nodes.allocate(Point3::new(0.0, -50.0, 10.0));
    let d = model.nodes.allocate(Point3::new(0.0, 50.0, 10.0));
    model.elements.add_new(Element::line(a, b, 1).unwrap());
    model.elements.add_new(Element::line(c, d, 1).unwrap());

    let opt = IntersectionSplitOptions::default().with_reuse_original_id_for_first(false);
    let mut log = quiet();
    let report = intersection_split::run(&mut model, &opt, Some(&mut log)).unwrap();

    assert_eq!(report.intersections_found, 1);
    assert!(!model.elements.contains(1));
    assert!(!model.elements.contains(2));
    assert_eq!(model.elements.len(), 4);

    let center = model.nodes.find_ids(&Point3::new(0.0, 0.0, 10.0));
    assert_eq!(center.len(), 1);
    for (_, element) in model.elements.iter() {
        assert!(element.uses_node(center[0]));
    }
}
