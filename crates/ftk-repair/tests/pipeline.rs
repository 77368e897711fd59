//! End-to-end runs of the staged repair pipeline.

use ftk_model::{Element, FeModel, Material, Point3, Property, PropertyKind};
use ftk_repair::{Pipeline, PipelineConfig, Stage, StageOutcome, Verdict};

/// Horizontal member doubled by a reversed copy, crossed by a vertical
/// member at mid-span.
fn crossed_frame() -> FeModel {
    let mut model = FeModel::new();
    let mat = model
        .materials
        .add_or_get(Material::new("S355", 210_000.0, 0.3, 7.85e-9).unwrap());
    let pid = model
        .properties
        .add_or_get(Property::new(PropertyKind::Pbeam, vec![10.0, 100.0, 50.0, 5.0], mat).unwrap());

    model.nodes.add_with_id(1, Point3::new(0.0, 0.0, 0.0));
    model.nodes.add_with_id(2, Point3::new(1000.0, 0.0, 0.0));
    model.nodes.add_with_id(3, Point3::new(500.0, -300.0, 0.0));
    model.nodes.add_with_id(4, Point3::new(500.0, 300.0, 0.0));
    model.elements.add_with_id(1, Element::line(1, 2, pid).unwrap());
    model.elements.add_with_id(2, Element::line(3, 4, pid).unwrap());
    model.elements.add_with_id(3, Element::line(2, 1, pid).unwrap());
    model
}

fn snapshot(model: &FeModel) -> (Vec<(i32, Vec<i32>, i32)>, Vec<(i32, Point3<f64>)>) {
    let elements = model
        .elements
        .iter()
        .map(|(id, e)| (id, e.node_ids().to_vec(), e.property_id()))
        .collect();
    let nodes = model.nodes.iter().map(|(id, p)| (id, *p)).collect();
    (elements, nodes)
}

#[test]
fn test_default_pipeline_repairs_crossed_frame() {
    let mut model = crossed_frame();
    let mut lines = Vec::new();
    let mut sink = |s: &str| lines.push(s.to_string());
    let report = Pipeline::new(PipelineConfig::default())
        .run(&mut model, Some(&mut sink))
        .unwrap();

    assert_eq!(report.baseline.worst(), Verdict::Critical);
    assert_eq!(report.stages.len(), 6);

    let Some(StageOutcome::IntersectionSplit(split)) =
        report.stage(Stage::IntersectionSplit).map(|s| &s.outcome)
    else {
        panic!("intersection stage missing");
    };
    assert_eq!(split.intersections_found, 2);
    assert_eq!(split.nodes_created, 1);

    let Some(StageOutcome::DuplicateMerge(merge)) =
        report.stage(Stage::DuplicateMerge).map(|s| &s.outcome)
    else {
        panic!("duplicate stage missing");
    };
    assert_eq!(merge.groups_found, 2);
    assert_eq!(merge.new_properties_created, 1);
    assert_eq!(report.merge_audit().len(), 6);

    assert_eq!(model.elements.len(), 4);
    assert_eq!(model.nodes.len(), 5);
    let last = report.stages.last().and_then(|s| s.sanity.as_ref()).unwrap();
    assert!(last.is_clean(), "{:?}", last.results);

    let center = model.nodes.find_ids(&Point3::new(500.0, 0.0, 0.0))[0];
    assert_eq!(model.elements.count_node_usage(center), 4);
    assert!(lines.iter().any(|l| l.contains("Stage: duplicate")));
}

#[test]
fn test_dry_run_leaves_model_untouched() {
    let mut model = crossed_frame();
    let before = snapshot(&model);
    let mut sink = |_: &str| {};
    let report = Pipeline::new(PipelineConfig::default().with_dry_run(true))
        .run(&mut model, Some(&mut sink))
        .unwrap();
    assert_eq!(snapshot(&model), before);
    assert_eq!(report.stages.len(), 6);
}

#[test]
fn test_logging_does_not_change_results() {
    let mut quiet = crossed_frame();
    let mut noisy = crossed_frame();
    let cfg = PipelineConfig::default().with_debug(true);

    Pipeline::new(cfg.clone()).run(&mut quiet, None).unwrap();
    let mut lines = Vec::new();
    let mut sink = |s: &str| lines.push(s.to_string());
    Pipeline::new(cfg).run(&mut noisy, Some(&mut sink)).unwrap();

    assert_eq!(snapshot(&quiet), snapshot(&noisy));
    assert!(!lines.is_empty());
}

#[test]
fn test_stage_subset_runs_only_selected() {
    let mut model = crossed_frame();
    let cfg = PipelineConfig::default()
        .with_stages([Stage::DuplicateMerge])
        .with_inspect_after_stage(false);
    let mut sink = |_: &str| {};
    let report = Pipeline::new(cfg).run(&mut model, Some(&mut sink)).unwrap();
    assert_eq!(report.stages.len(), 1);
    assert!(report.stages[0].sanity.is_none());
    assert_eq!(model.elements.len(), 2);
}

#[test]
fn test_refinement_stage_subdivides_long_members() {
    let mut model = crossed_frame();
    let cfg = PipelineConfig::default()
        .with_stages([Stage::MeshRefinement])
        .with_refinement_target(250.0);
    let mut sink = |_: &str| {};
    Pipeline::new(cfg).run(&mut model, Some(&mut sink)).unwrap();
    // two 1000 members into 4 pieces each, 600 member into 3
    assert_eq!(model.elements.len(), 11);
}

#[test]
fn test_collinear_stage_drops_collapsed_rung() {
    let mut model = FeModel::new();
    model.nodes.add_with_id(1, Point3::new(0.0, 0.0, 0.0));
    model.nodes.add_with_id(2, Point3::new(100.0, 0.0, 0.0));
    model.nodes.add_with_id(3, Point3::new(0.0, 0.2, 0.0));
    model.nodes.add_with_id(4, Point3::new(100.0, 0.2, 0.0));
    model.elements.add_with_id(1, Element::line(1, 2, 1).unwrap());
    model.elements.add_with_id(2, Element::line(3, 4, 1).unwrap());
    model.elements.add_with_id(3, Element::line(1, 3, 1).unwrap());

    let cfg = PipelineConfig::default()
        .with_stages([Stage::CollinearOverlap])
        .with_inspect_after_stage(false);
    let mut sink = |_: &str| {};
    Pipeline::new(cfg).run(&mut model, Some(&mut sink)).unwrap();

    for (eid, _) in model.elements.iter() {
        let len = model.element_length(eid).unwrap();
        assert!(len > 1e-3, "element {eid} has length {len}");
    }
}
