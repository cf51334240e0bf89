use crate::style::*;
use sysflow_core::{Connection, ConnectionType, Node, Shape};

#[test]
fn parse_style_keeps_only_key_value_pairs() {
    let map = parse_style("ellipse;fillColor=#ffffff;dashed=;endArrow=none;;");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("fillColor"), Some(&"#ffffff"));
    assert_eq!(map.get("endArrow"), Some(&"none"));
    assert!(!map.contains_key("ellipse"));
    assert!(!map.contains_key("dashed"));
}

#[test]
fn node_style_starts_with_the_shape_token() {
    let mut node = Node::new("N0".to_string());
    assert!(node_style(&node).starts_with("rounded=0;fillColor=#ffffff;strokeColor=#333333;"));

    node.shape = Shape::Circle;
    node.bg_color = "ABCDEF".to_string();
    let style = node_style(&node);
    assert!(style.starts_with("ellipse;fillColor=#abcdef;"));
    assert!(style.contains("fontColor=#000000;"));

    node.shape = Shape::Cylinder;
    assert!(node_style(&node).starts_with("shape=cylinder;"));
}

#[test]
fn edge_style_encodes_pattern_arrow_and_type() {
    let conn = Connection {
        source: "N0".to_string(),
        kind: ConnectionType::Dashed,
        color: "#FF0000".to_string(),
        width: 3,
        ..Connection::default()
    };
    assert_eq!(
        edge_style(&conn),
        "edgeStyle=orthogonalEdgeStyle;curved=1;strokeColor=#ff0000;strokeWidth=3;\
         dashed=1;dashPattern=5 5;endArrow=classic;connType=dashed;movable=1;resizable=1;"
    );

    let plain = Connection {
        kind: ConnectionType::Plain,
        ..Connection::default()
    };
    let style = edge_style(&plain);
    assert!(style.contains("endArrow=none;"));
    assert!(!style.contains("dashed=1"));
}

#[test]
fn connection_type_survives_the_edge_style() {
    for kind in ConnectionType::ALL {
        let conn = Connection {
            source: "N0".to_string(),
            label: "calls".to_string(),
            kind,
            color: "#00ff00".to_string(),
            width: 4,
            arrow: false,
        };
        let back = connection_from_edge_style("N0", "calls", &edge_style(&conn));
        assert_eq!(back.kind, kind, "{}", kind.as_str());
        assert_eq!(back.width, 4);
        assert_eq!(back.color, "#00ff00");
        assert!(!back.arrow);
        assert_eq!(back.source, "N0");
        assert_eq!(back.label, "calls");
    }
}

#[test]
fn forced_no_arrow_types_come_back_without_arrow() {
    let conn = Connection {
        source: "N0".to_string(),
        kind: ConnectionType::ThickNo,
        ..Connection::default()
    };
    assert!(conn.arrow);
    let back = connection_from_edge_style("N0", "", &edge_style(&conn));
    assert_eq!(back.kind, ConnectionType::ThickNo);
    assert!(!back.arrow);
}

#[test]
fn foreign_edge_styles_fall_back_to_dash_inference() {
    let dotted = connection_from_edge_style("A", "", "dashed=1;dashPattern=2 2;strokeWidth=9px;");
    assert_eq!(dotted.kind, ConnectionType::Dotted);
    assert_eq!(dotted.width, 6);
    assert_eq!(dotted.color, "#333333");
    assert!(dotted.arrow);

    let dashed = connection_from_edge_style("A", "", "dashed=1;connType=wavy;strokeWidth=0;");
    assert_eq!(dashed.kind, ConnectionType::Dashed);
    assert_eq!(dashed.width, 2);

    let solid = connection_from_edge_style("A", "", "dashed=0;strokeWidth=-3;endArrow=none;");
    assert_eq!(solid.kind, ConnectionType::Solid);
    assert_eq!(solid.width, 1);
    assert!(!solid.arrow);

    let bare = connection_from_edge_style("A", "", "");
    assert_eq!(bare.kind, ConnectionType::Solid);
    assert_eq!(bare.width, 2);
}
