//! `key=value;` style strings for canvas cells.

use rustc_hash::FxHashMap;
use sysflow_core::model::{DEFAULT_EDGE_COLOR, DEFAULT_EDGE_WIDTH};
use sysflow_core::sanitize::sanitize_color;
use sysflow_core::{Connection, ConnectionType, Node, Shape, Subgroup, System};

/// Key of the token that carries the exact [`ConnectionType`] of an edge.
pub const CONN_TYPE_KEY: &str = "connType";

/// Splits a style string into `key=value` pairs. Bare tokens (`ellipse;`) and empty values
/// are skipped.
pub fn parse_style(style: &str) -> FxHashMap<&str, &str> {
    let mut map = FxHashMap::default();
    for token in style.split(';') {
        let mut parts = token.split('=');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        if !key.is_empty() && !value.is_empty() {
            map.insert(key, value);
        }
    }
    map
}

pub fn system_style(system: &System) -> String {
    format!(
        "fillColor={};strokeColor={};strokeWidth=2;\
         rounded=1;fontSize=14;fontStyle=1;\
         verticalAlign=top;labelPosition=center;align=center;\
         spacingTop=10;spacingLeft=0;spacingRight=0;\
         resizable=1;movable=1;container=1;foldable=0;",
        sanitize_color(&system.fill),
        sanitize_color(&system.stroke)
    )
}

pub fn subgroup_style(subgroup: &Subgroup) -> String {
    format!(
        "fillColor={};strokeColor={};strokeWidth=1;\
         rounded=1;fontSize=12;\
         verticalAlign=top;labelPosition=center;align=center;\
         spacingTop=8;\
         resizable=1;movable=1;container=1;foldable=0;",
        sanitize_color(&subgroup.fill),
        sanitize_color(&subgroup.stroke)
    )
}

fn shape_style(shape: Shape) -> &'static str {
    match shape {
        Shape::Circle => "ellipse;",
        Shape::Diamond => "rhombus;",
        Shape::Cylinder => "shape=cylinder;",
        Shape::Stadium | Shape::Round => "rounded=1;",
        Shape::Rect | Shape::Subroutine => "rounded=0;",
    }
}

pub fn node_style(node: &Node) -> String {
    format!(
        "{}fillColor={};strokeColor={};\
         fontColor={};fontSize=11;align=center;\
         verticalAlign=middle;whiteSpace=wrap;html=1;\
         resizable=1;movable=1;",
        shape_style(node.shape),
        sanitize_color(&node.bg_color),
        sanitize_color(&node.outline_color),
        sanitize_color(&node.text_color)
    )
}

pub fn edge_style(conn: &Connection) -> String {
    let mut style = format!(
        "edgeStyle=orthogonalEdgeStyle;curved=1;strokeColor={};strokeWidth={};",
        sanitize_color(&conn.color),
        sysflow_core::model::clamp_width(conn.width)
    );
    match conn.kind {
        ConnectionType::Dashed | ConnectionType::DashedNo => {
            style.push_str("dashed=1;dashPattern=5 5;");
        }
        ConnectionType::Dotted | ConnectionType::DottedNo => {
            style.push_str("dashed=1;dashPattern=2 2;");
        }
        _ => {}
    }
    style.push_str(if conn.has_arrow() {
        "endArrow=classic;"
    } else {
        "endArrow=none;"
    });
    style.push_str(CONN_TYPE_KEY);
    style.push('=');
    style.push_str(conn.kind.as_str());
    style.push_str(";movable=1;resizable=1;");
    style
}

/// Recovers connection attributes from an edge style.
///
/// The `connType` token wins when it names a known type; otherwise the type is inferred
/// from the dash tokens, which can only tell solid, dashed and dotted apart.
pub fn connection_from_edge_style(source: &str, label: &str, style: &str) -> Connection {
    let map = parse_style(style);
    let kind = map
        .get(CONN_TYPE_KEY)
        .and_then(|t| ConnectionType::parse(t))
        .unwrap_or_else(|| infer_kind(&map));
    let width = map
        .get("strokeWidth")
        .and_then(|w| leading_int(w))
        .filter(|w| *w != 0)
        .map_or(DEFAULT_EDGE_WIDTH, |w| {
            w.clamp(1, i64::from(sysflow_core::model::MAX_EDGE_WIDTH)) as u8
        });
    Connection {
        source: source.to_string(),
        label: label.to_string(),
        kind,
        color: sanitize_color(map.get("strokeColor").copied().unwrap_or(DEFAULT_EDGE_COLOR)),
        width,
        arrow: map.get("endArrow").copied() != Some("none"),
    }
}

fn infer_kind(map: &FxHashMap<&str, &str>) -> ConnectionType {
    match map.get("dashed").copied() {
        Some(v) if v != "0" => {
            if map.get("dashPattern").copied() == Some("2 2") {
                ConnectionType::Dotted
            } else {
                ConnectionType::Dashed
            }
        }
        _ => ConnectionType::Solid,
    }
}

/// Optional sign and leading digits; anything after them is ignored.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|v| v * sign)
}
