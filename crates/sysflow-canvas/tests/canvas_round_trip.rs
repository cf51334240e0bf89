use sysflow_canvas::style::edge_style;
use sysflow_canvas::{
    CanvasEngine, CanvasEvent, CanvasOptions, Geometry, LabelChange, MemoryCanvas, ROOT_LAYER,
    apply_label_change, build_canvas, reconcile,
};
use sysflow_core::{
    Connection, ConnectionType, EmitOptions, Model, NodeForm, SystemStyle, import_json,
    to_mermaid,
};

fn model() -> Model {
    let mut model = Model::new();
    model.add_system("Frontend", &SystemStyle::default()).unwrap();
    model.add_system("Backend", &SystemStyle::default()).unwrap();
    for (label, system) in [("Web", "Frontend"), ("API", "Backend"), ("Store", "Backend")] {
        let id = model.add_node().unwrap().id.clone();
        let form = NodeForm {
            label: label.to_string(),
            system: system.to_string(),
            ..NodeForm::default()
        };
        model.save_node(&id, &form).unwrap();
    }
    let idx = model.add_connection("N1").unwrap();
    model
        .update_connection("N1", idx, Connection::from_source("N0"))
        .unwrap();
    model
}

#[test]
fn canvas_edits_flow_back_into_the_diagram_text() {
    let mut model = model();
    let mut canvas = MemoryCanvas::new();
    build_canvas(&mut canvas, &model, &CanvasOptions::default()).unwrap();
    canvas.take_events();

    // Backend dragged above Frontend, Store dropped out of its system, a thick edge drawn.
    canvas.move_cell("Backend", 0.0, -1000.0).unwrap();
    canvas
        .move_cell_into("N2", ROOT_LAYER, Geometry::new(800.0, 40.0, 70.0, 40.0))
        .unwrap();
    let thick = Connection {
        kind: ConnectionType::Thick,
        ..Connection::from_source("N1")
    };
    canvas
        .connect("N1", "N2", "writes", &edge_style(&thick))
        .unwrap();
    let events = canvas.take_events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[2], CanvasEvent::CellConnected { .. }));

    let report = reconcile(&canvas, &mut model);
    assert!(report.order_changed);
    assert_eq!(report.reassigned.len(), 1);
    assert_eq!(report.connections, 2);
    assert_eq!(model.systems_order, vec!["Backend", "Frontend"]);

    let text = to_mermaid(&model, &EmitOptions::default());
    let backend = text.find("subgraph Backend[\"Backend\"]").unwrap();
    let frontend = text.find("subgraph Frontend[\"Frontend\"]").unwrap();
    assert!(backend < frontend);
    assert!(!text.contains("N2[\"Store\"]"));
    assert!(text.contains("\nN0 --> N1\nN1 ==>|writes| N2\n"));
}

#[test]
fn renamed_system_survives_a_snapshot_round_trip_and_rebuild() {
    let mut model = model();
    let mut canvas = MemoryCanvas::new();
    build_canvas(&mut canvas, &model, &CanvasOptions::default()).unwrap();

    canvas.edit_label("Backend", "Core Services").unwrap();
    let change = apply_label_change(&mut canvas, &mut model, "Backend", "Core Services").unwrap();
    assert!(matches!(change, LabelChange::SystemRenamed { .. }));

    let json = sysflow_core::export_json(&model).unwrap();
    let restored = import_json(&json).unwrap();
    assert_eq!(restored.systems_order, vec!["Frontend", "Core Services"]);

    let mut fresh = MemoryCanvas::new();
    let report = build_canvas(&mut fresh, &restored, &CanvasOptions::default()).unwrap();
    assert_eq!(report.systems, 2);
    assert_eq!(report.edges, 1);
    assert_eq!(fresh.parent_of("N1").as_deref(), Some("Core_Services"));
    assert_eq!(fresh.cell("Core_Services").unwrap().value, "Core Services");
}
