use super::api_model;
use crate::*;
use sysflow_core::{Layout, Model, NodeForm, SubgroupStyle, SystemStyle};

fn geo(x: f64, y: f64, w: f64, h: f64) -> Geometry {
    Geometry::new(x, y, w, h)
}

fn build(model: &Model) -> (MemoryCanvas, BuildReport) {
    let mut canvas = MemoryCanvas::new();
    let report = build_canvas(&mut canvas, model, &CanvasOptions::default()).unwrap();
    (canvas, report)
}

fn assign(model: &mut Model, id: &str, system: &str, subgroup: &str) {
    let form = NodeForm {
        system: system.to_string(),
        subgroup: subgroup.to_string(),
        ..NodeForm::from_node(model.node(id).unwrap())
    };
    model.save_node(id, &form).unwrap();
}

#[test]
fn builds_containers_nodes_and_edges() {
    let (canvas, report) = build(&api_model());
    assert_eq!(
        report,
        BuildReport {
            systems: 1,
            subgroups: 0,
            nodes: 2,
            edges: 1,
            skipped_edges: 0,
        }
    );

    let system = canvas.cell("API").unwrap();
    assert_eq!(system.value, "API");
    assert_eq!(system.parent, ROOT_LAYER);
    assert!(system.style.contains("container=1;"));

    let gateway = canvas.cell("N0").unwrap();
    assert_eq!(gateway.value, "Gateway");
    assert_eq!(gateway.parent, "API");

    let edge = canvas.cell("e0").unwrap();
    assert_eq!(edge.source.as_deref(), Some("N0"));
    assert_eq!(edge.target.as_deref(), Some("N1"));
    assert_eq!(edge.parent, ROOT_LAYER);
    assert!(edge.style.contains("connType=dashed;"));
}

#[test]
fn containers_shrink_to_their_nodes_after_the_batch() {
    let (canvas, _) = build(&api_model());
    // nodes laid out at (20,75) and (105,75), then the container wraps them with 20 padding
    assert_eq!(canvas.geometry("N0"), Some(geo(20.0, 20.0, 70.0, 40.0)));
    assert_eq!(canvas.geometry("N1"), Some(geo(105.0, 20.0, 70.0, 40.0)));
    assert_eq!(canvas.geometry("API"), Some(geo(50.0, 105.0, 195.0, 80.0)));
}

#[test]
fn view_scale_is_clamped_after_fit() {
    let (canvas, _) = build(&api_model());
    assert_eq!(canvas.scale(), 1.2);

    let mut small = MemoryCanvas::with_viewport(100.0, 100.0);
    build_canvas(&mut small, &api_model(), &CanvasOptions::default()).unwrap();
    assert_eq!(small.scale(), 0.5);
}

#[test]
fn empty_systems_use_minimum_size_and_follow_the_arrangement() {
    let mut model = Model::new();
    for name in ["A", "B", "C"] {
        model.add_system(name, &SystemStyle::default()).unwrap();
    }
    model.set_arrangement(Layout::Horizontal);
    let (canvas, _) = build(&model);
    assert_eq!(canvas.geometry("A"), Some(geo(50.0, 50.0, 220.0, 150.0)));
    assert_eq!(canvas.geometry("B"), Some(geo(310.0, 50.0, 220.0, 150.0)));
    assert_eq!(canvas.geometry("C"), Some(geo(570.0, 50.0, 220.0, 150.0)));

    model.set_arrangement(Layout::Vertical);
    let (canvas, _) = build(&model);
    assert_eq!(canvas.geometry("B"), Some(geo(50.0, 240.0, 220.0, 150.0)));
    assert_eq!(canvas.geometry("C"), Some(geo(50.0, 430.0, 220.0, 150.0)));
}

#[test]
fn saved_positions_win_and_later_systems_continue_from_them() {
    let mut model = Model::new();
    for name in ["A", "B", "C"] {
        model.add_system(name, &SystemStyle::default()).unwrap();
    }
    model.save_geometry("B", 400.0, 300.0, 220.0, 150.0);
    let (canvas, _) = build(&model);
    assert_eq!(canvas.geometry("A"), Some(geo(50.0, 50.0, 220.0, 150.0)));
    assert_eq!(canvas.geometry("B"), Some(geo(400.0, 300.0, 220.0, 150.0)));
    assert_eq!(canvas.geometry("C"), Some(geo(400.0, 490.0, 220.0, 150.0)));
}

#[test]
fn subgroup_containers_nest_inside_their_system() {
    let mut model = Model::new();
    model.add_system("Core", &SystemStyle::default()).unwrap();
    model
        .add_subgroup("Core", "Edge Tier", &SubgroupStyle::default())
        .unwrap();
    model.add_node().unwrap();
    model.add_node().unwrap();
    assign(&mut model, "N0", "Core", "Edge Tier");
    assign(&mut model, "N1", "Core", "");

    let (canvas, report) = build(&model);
    assert_eq!(report.subgroups, 1);

    let sg = canvas.cell("Core_Edge_Tier").unwrap();
    assert_eq!(sg.parent, "Core");
    assert_eq!(sg.value, "Edge Tier");
    assert!(sg.style.contains("fillColor=#eef5ff;"));

    assert_eq!(canvas.parent_of("N0").as_deref(), Some("Core_Edge_Tier"));
    assert_eq!(canvas.geometry("N0"), Some(geo(15.0, 35.0, 70.0, 40.0)));
    assert_eq!(canvas.parent_of("N1").as_deref(), Some("Core"));

    // subgroup at (20,40) 150x90, loose node below it at (20,185); then wrapped with padding
    assert_eq!(canvas.geometry("Core_Edge_Tier"), Some(geo(20.0, 20.0, 150.0, 90.0)));
    assert_eq!(canvas.geometry("N1"), Some(geo(20.0, 165.0, 70.0, 40.0)));
}

#[test]
fn nodes_without_a_system_sit_on_the_root_layer() {
    let mut model = api_model();
    model.add_node().unwrap();
    let (canvas, report) = build(&model);
    assert_eq!(report.nodes, 3);
    assert_eq!(canvas.parent_of("N2").as_deref(), Some(ROOT_LAYER));
    // below the 240x165 API container
    assert_eq!(canvas.geometry("N2"), Some(geo(50.0, 255.0, 70.0, 40.0)));

    let mut only_loose = Model::new();
    only_loose.add_node().unwrap();
    let (canvas, _) = build(&only_loose);
    assert_eq!(canvas.geometry("N0"), Some(geo(50.0, 50.0, 70.0, 40.0)));
}

#[test]
fn connections_without_a_drawable_source_are_skipped() {
    let mut model = api_model();
    model.add_connection("N0").unwrap();
    let idx = model.add_connection("N0").unwrap();
    let ghost = sysflow_core::Connection::from_source("N9");
    model.update_connection("N0", idx, ghost).unwrap();

    let (canvas, report) = build(&model);
    assert_eq!(report.edges, 1);
    assert_eq!(report.skipped_edges, 2);
    assert_eq!(canvas.cells().iter().filter(|c| c.is_edge()).count(), 1);
}

#[test]
fn rebuild_replaces_previous_cells() {
    let mut canvas = MemoryCanvas::new();
    canvas
        .insert_vertex(ROOT_LAYER, "stale", "", geo(0.0, 0.0, 1.0, 1.0), "")
        .unwrap();
    build_canvas(&mut canvas, &api_model(), &CanvasOptions::default()).unwrap();
    assert!(canvas.cell("stale").is_none());
    assert_eq!(canvas.len(), 4);

    match canvas.take_events().last() {
        Some(CanvasEvent::CellsAdded { cells }) => assert_eq!(cells.len(), 4),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn options_read_canvas_config() {
    let cfg = sysflow_core::EditorConfig::with_overrides(&serde_json::json!({
        "canvas": { "fitBorder": 10, "maxScale": 2.5 }
    }));
    let options = CanvasOptions::from_config(&cfg);
    assert_eq!(options.fit_border, 10.0);
    assert_eq!(options.max_scale, 2.5);
    assert_eq!(options.group_padding, 20.0);
    assert_eq!(options.zoom_up_to, 0.5);
}
