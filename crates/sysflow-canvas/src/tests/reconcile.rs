use super::api_model;
use crate::style::edge_style;
use crate::*;
use sysflow_core::{
    Connection, ConnectionType, EditError, Layout, Model, NodeForm, SubgroupStyle, SystemStyle,
};

fn built(model: &Model) -> MemoryCanvas {
    let mut canvas = MemoryCanvas::new();
    build_canvas(&mut canvas, model, &CanvasOptions::default()).unwrap();
    canvas.take_events();
    canvas
}

fn three_systems(arrangement: Layout) -> Model {
    let mut model = Model::new();
    for name in ["A", "B", "C"] {
        model.add_system(name, &SystemStyle::default()).unwrap();
    }
    model.set_arrangement(arrangement);
    model
}

#[test]
fn dragging_a_system_reorders_by_position() {
    let mut model = three_systems(Layout::Vertical);
    let mut canvas = built(&model);
    canvas.move_cell("C", 0.0, -500.0).unwrap();

    let report = reconcile(&canvas, &mut model);
    assert!(report.order_changed);
    assert_eq!(model.systems_order, vec!["C", "A", "B"]);
    assert_eq!(model.placement["C"].order, 0);
    assert_eq!(model.placement["C"].y, Some(-70.0));
    assert!(model.is_order_consistent());
}

#[test]
fn horizontal_arrangement_orders_by_x() {
    let mut model = three_systems(Layout::Horizontal);
    let mut canvas = built(&model);
    // a vertical drag does not reorder a horizontal arrangement
    canvas.move_cell("C", 0.0, -500.0).unwrap();
    assert!(!reconcile(&canvas, &mut model).order_changed);

    canvas.move_cell("A", 600.0, 0.0).unwrap();
    assert!(reconcile(&canvas, &mut model).order_changed);
    assert_eq!(model.systems_order, vec!["B", "C", "A"]);
}

#[test]
fn unchanged_order_still_records_geometry() {
    let mut model = three_systems(Layout::Vertical);
    let canvas = built(&model);
    let report = reconcile(&canvas, &mut model);
    assert!(!report.order_changed);
    assert_eq!(model.systems_order, vec!["A", "B", "C"]);
    let b = &model.placement["B"];
    assert_eq!((b.x, b.y, b.width, b.height), (Some(50.0), Some(240.0), Some(220.0), Some(150.0)));
}

#[test]
fn moving_nodes_between_containers_reassigns_them() {
    let mut model = api_model();
    model
        .add_subgroup("API", "Edge", &SubgroupStyle::default())
        .unwrap();
    let mut canvas = built(&model);

    canvas
        .move_cell_into("N0", ROOT_LAYER, Geometry::new(600.0, 50.0, 70.0, 40.0))
        .unwrap();
    canvas
        .move_cell_into("N1", "API_Edge", Geometry::new(15.0, 35.0, 70.0, 40.0))
        .unwrap();

    let report = reconcile(&canvas, &mut model);
    assert_eq!(
        report.reassigned,
        vec![
            Reassignment {
                node: "N0".to_string(),
                system: String::new(),
                subgroup: String::new(),
            },
            Reassignment {
                node: "N1".to_string(),
                system: "API".to_string(),
                subgroup: "Edge".to_string(),
            },
        ]
    );
    assert!(model.node("N0").unwrap().is_unassigned());
    assert_eq!(model.node("N1").unwrap().subgroup, "Edge");

    // back into the system root clears the subgroup only
    canvas
        .move_cell_into("N1", "API", Geometry::new(20.0, 20.0, 70.0, 40.0))
        .unwrap();
    let report = reconcile(&canvas, &mut model);
    assert_eq!(report.reassigned.len(), 1);
    let n1 = model.node("N1").unwrap();
    assert_eq!((n1.system.as_str(), n1.subgroup.as_str()), ("API", ""));
}

#[test]
fn connections_are_rebuilt_from_edges() {
    let mut model = api_model();
    model.add_connection("N0").unwrap();
    let mut canvas = built(&model);

    canvas.remove_cells(&["e0"]).unwrap();
    let dotted = Connection {
        source: "N1".to_string(),
        kind: ConnectionType::DottedNo,
        color: "#00aa00".to_string(),
        width: 5,
        arrow: false,
        ..Connection::default()
    };
    canvas
        .connect("N1", "N0", "reads", &edge_style(&dotted))
        .unwrap();

    let report = reconcile(&canvas, &mut model);
    assert_eq!(report.connections, 1);
    assert!(model.node("N1").unwrap().connections.is_empty());

    let conns = &model.node("N0").unwrap().connections;
    assert_eq!(conns.len(), 1, "the blank connection has no edge and is dropped");
    assert_eq!(conns[0].source, "N1");
    assert_eq!(conns[0].label, "reads");
    assert_eq!(conns[0].kind, ConnectionType::DottedNo);
    assert_eq!(conns[0].color, "#00aa00");
    assert_eq!(conns[0].width, 5);
    assert!(!conns[0].arrow);
}

#[test]
fn edges_drawn_without_type_token_are_inferred() {
    let mut model = api_model();
    let mut canvas = built(&model);
    canvas
        .connect("N0", "N1", "", "dashed=1;dashPattern=2 2;strokeWidth=3;")
        .unwrap();
    canvas
        .connect("N1", "API", "", "endArrow=none;")
        .unwrap();

    let report = reconcile(&canvas, &mut model);
    assert_eq!(report.connections, 2, "edges to containers are ignored");
    let conns = &model.node("N1").unwrap().connections;
    assert_eq!(conns[0].kind, ConnectionType::Dashed);
    assert_eq!(conns[1].kind, ConnectionType::Dotted);
    assert_eq!(conns[1].width, 3);
    assert!(conns[1].arrow);
}

#[test]
fn renaming_a_system_label_renames_the_system_and_its_cells() {
    let mut model = api_model();
    model
        .add_subgroup("API", "Edge", &SubgroupStyle::default())
        .unwrap();
    let mut canvas = built(&model);
    canvas.edit_label("API", "Public API").unwrap();

    let change = apply_label_change(&mut canvas, &mut model, "API", "Public API").unwrap();
    assert_eq!(
        change,
        LabelChange::SystemRenamed {
            old: "API".to_string(),
            new: "Public API".to_string(),
        }
    );
    assert!(model.systems.contains_key("Public API"));
    assert_eq!(model.node("N0").unwrap().system, "Public API");
    assert!(canvas.cell("API").is_none());
    assert_eq!(canvas.cell("Public_API").unwrap().value, "Public API");
    assert_eq!(canvas.parent_of("N0").as_deref(), Some("Public_API"));
    assert_eq!(canvas.parent_of("Public_API_Edge").as_deref(), Some("Public_API"));

    let report = reconcile(&canvas, &mut model);
    assert!(report.reassigned.is_empty());
}

#[test]
fn rejected_system_rename_restores_the_label() {
    let mut model = api_model();
    model.add_system("Billing", &SystemStyle::default()).unwrap();
    let mut canvas = built(&model);
    canvas.edit_label("API", "Billing").unwrap();

    let err = apply_label_change(&mut canvas, &mut model, "API", "Billing").unwrap_err();
    assert_eq!(
        err,
        EditError::SystemExists {
            name: "Billing".to_string()
        }
    );
    assert_eq!(canvas.cell("API").unwrap().value, "API");
    assert!(model.systems.contains_key("API"));

    canvas.edit_label("API", "   ").unwrap();
    assert_eq!(
        apply_label_change(&mut canvas, &mut model, "API", "   "),
        Ok(LabelChange::Reverted)
    );
    assert_eq!(canvas.cell("API").unwrap().value, "API");
}

#[test]
fn subgroup_and_node_labels() {
    let mut model = api_model();
    model
        .add_subgroup("API", "Edge", &SubgroupStyle::default())
        .unwrap();
    let form = NodeForm {
        subgroup: "Edge".to_string(),
        ..NodeForm::from_node(model.node("N0").unwrap())
    };
    model.save_node("N0", &form).unwrap();
    let mut canvas = built(&model);

    assert_eq!(
        apply_label_change(&mut canvas, &mut model, "API_Edge", "Front"),
        Ok(LabelChange::SubgroupRenamed {
            system: "API".to_string(),
            old: "Edge".to_string(),
            new: "Front".to_string(),
        })
    );
    assert_eq!(model.subgroup_options("API"), vec!["Front"]);
    assert_eq!(model.node("N0").unwrap().subgroup, "Front");
    assert_eq!(canvas.parent_of("N0").as_deref(), Some("API_Front"));

    assert_eq!(
        apply_label_change(&mut canvas, &mut model, "N1", "  Primary DB "),
        Ok(LabelChange::NodeRelabeled {
            id: "N1".to_string()
        })
    );
    assert_eq!(model.node("N1").unwrap().label, "Primary DB");

    assert_eq!(
        apply_label_change(&mut canvas, &mut model, "e0", "uses"),
        Ok(LabelChange::Ignored)
    );
}
