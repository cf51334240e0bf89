//! The JSON snapshot file: export from a live model, lenient field-by-field import.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ImportError;
use crate::model::{
    Connection, ConnectionType, DEFAULT_BG_COLOR, DEFAULT_EDGE_COLOR, DEFAULT_EDGE_WIDTH,
    DEFAULT_OUTLINE_COLOR, DEFAULT_SUBGROUP_FILL, DEFAULT_SUBGROUP_STROKE, DEFAULT_SYSTEM_FILL,
    DEFAULT_SYSTEM_STROKE, DEFAULT_TEXT_COLOR, Layout, MAX_EDGE_WIDTH, MIN_EDGE_WIDTH, Model, Node,
    Placement, Shape, Subgroup, System,
};
use crate::sanitize::sanitize_color;

pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// On-disk shape of an exported diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub systems: IndexMap<String, System>,
    pub systems_order: Vec<String>,
    pub systems_arrangement: Layout,
    pub diagram_legend: String,
    pub system_placement: IndexMap<String, Placement>,
    pub nodes: Vec<Node>,
}

impl Snapshot {
    pub fn from_model(model: &Model) -> Self {
        Self {
            systems: model.systems.clone(),
            systems_order: model.systems_order.clone(),
            systems_arrangement: model.arrangement,
            diagram_legend: model.legend.clone(),
            system_placement: model.placement.clone(),
            nodes: model.nodes.clone(),
        }
    }
}

/// Pretty-printed (two-space) snapshot JSON of `model`.
pub fn export_json(model: &Model) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Snapshot::from_model(model))
}

/// Parses and normalizes snapshot text into a fresh model.
pub fn import_json(text: &str) -> ImportResult<Model> {
    let raw: Value = serde_json::from_str(text)?;
    import_value(&raw)
}

/// Normalizes a parsed snapshot.
///
/// Absent or falsy fields take their documented defaults, colors are sanitized, widths are
/// clamped and unknown enum names fall back. Structural problems (a non-object root, a field
/// of the wrong container type, a node without an id, a duplicate node id) reject the whole
/// snapshot.
pub fn import_value(raw: &Value) -> ImportResult<Model> {
    let root = raw.as_object().ok_or(ImportError::NotAnObject)?;

    let mut model = Model::new();
    model.arrangement = Layout::from_name(&text_or(root, "systemsArrangement", "vertical"));
    model.legend = text_or(root, "diagramLegend", "");

    if let Some(systems) = object_field(root, "systems", "")? {
        for (name, value) in systems {
            if name.trim().is_empty() {
                tracing::debug!("skipping system with an empty name");
                continue;
            }
            let path = format!("systems.{name}");
            let obj = value.as_object().ok_or_else(|| invalid(&path, "an object"))?;
            model.systems.insert(name.clone(), normalize_system(obj, &path)?);
        }
    }

    if let Some(order) = array_field(root, "systemsOrder", "")? {
        model.systems_order = order
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    if let Some(placement) = object_field(root, "systemPlacement", "")? {
        for (index, (name, value)) in placement.iter().enumerate() {
            let path = format!("systemPlacement.{name}");
            let obj = value.as_object().ok_or_else(|| invalid(&path, "an object"))?;
            model
                .placement
                .insert(name.clone(), normalize_placement(obj, index));
        }
    }

    if let Some(nodes) = array_field(root, "nodes", "")? {
        let mut seen: IndexSet<String> = IndexSet::new();
        for (index, value) in nodes.iter().enumerate() {
            let path = format!("nodes[{index}]");
            let obj = value.as_object().ok_or_else(|| invalid(&path, "an object"))?;
            let node = normalize_node(obj, index, &path)?;
            if !seen.insert(node.id.clone()) {
                return Err(ImportError::DuplicateNodeId { id: node.id });
            }
            model.nodes.push(node);
        }
    }

    reconcile_placement(&mut model);
    model.recompute_node_counter();
    tracing::debug!(
        systems = model.systems.len(),
        nodes = model.nodes.len(),
        next_node = model.node_counter(),
        "snapshot normalized"
    );
    Ok(model)
}

/// Gives every known system a placement entry, drops entries for unknown systems and
/// re-derives `systems_order`.
fn reconcile_placement(model: &mut Model) {
    model.migrate_legacy_placement_if_needed();
    let listed: Vec<String> = model
        .systems_order
        .iter()
        .chain(model.systems.keys())
        .filter(|name| model.systems.contains_key(*name))
        .cloned()
        .collect();
    for name in listed {
        model.ensure_placement(&name);
    }
    let systems = &model.systems;
    model.placement.retain(|name, _| systems.contains_key(name));
    model.rebuild_systems_order();
}

fn normalize_system(obj: &Map<String, Value>, path: &str) -> ImportResult<System> {
    let mut system = System {
        stroke: sanitize_color(&text_or(obj, "stroke", DEFAULT_SYSTEM_STROKE)),
        fill: sanitize_color(&text_or(obj, "fill", DEFAULT_SYSTEM_FILL)),
        layout: Layout::from_name(&text_or(obj, "layout", "vertical")),
        subgroups: IndexMap::new(),
    };
    if let Some(subgroups) = object_field(obj, "subgroups", path)? {
        for (name, value) in subgroups {
            let sg_path = format!("{path}.subgroups.{name}");
            let sg = value
                .as_object()
                .ok_or_else(|| invalid(&sg_path, "an object"))?;
            system.subgroups.insert(
                name.clone(),
                Subgroup {
                    layout: Layout::from_name(&text_or(sg, "layout", "vertical")),
                    fill: sanitize_color(&text_or(sg, "fill", DEFAULT_SUBGROUP_FILL)),
                    stroke: sanitize_color(&text_or(sg, "stroke", DEFAULT_SUBGROUP_STROKE)),
                },
            );
        }
    }
    Ok(system)
}

fn normalize_placement(obj: &Map<String, Value>, index: usize) -> Placement {
    let coord = |key: &str| obj.get(key).and_then(Value::as_f64);
    Placement {
        order: obj
            .get("order")
            .and_then(Value::as_f64)
            .filter(|o| o.is_finite() && *o >= 0.0)
            .map_or(index, |o| o as usize),
        x: coord("x"),
        y: coord("y"),
        width: coord("width"),
        height: coord("height"),
    }
}

fn normalize_node(obj: &Map<String, Value>, index: usize, path: &str) -> ImportResult<Node> {
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ImportError::MissingNodeId { index }),
    };

    let mut node = Node::new(id);
    node.label = text_or(obj, "label", "");
    node.shape = Shape::from_name(&text_or(obj, "shape", "rect"));
    node.text_color = sanitize_color(&text_or(obj, "textColor", DEFAULT_TEXT_COLOR));
    node.bg_color = sanitize_color(&text_or(obj, "bgColor", DEFAULT_BG_COLOR));
    node.outline_color = sanitize_color(&text_or(obj, "outlineColor", DEFAULT_OUTLINE_COLOR));
    node.system = text_or(obj, "system", "");
    node.subgroup = text_or(obj, "subgroup", "");
    node.desc = text_or(obj, "desc", "");

    if let Some(connections) = array_field(obj, "connections", path)? {
        for (ci, value) in connections.iter().enumerate() {
            let c_path = format!("{path}.connections[{ci}]");
            let c = value
                .as_object()
                .ok_or_else(|| invalid(&c_path, "an object"))?;
            node.connections.push(normalize_connection(c));
        }
    }
    Ok(node)
}

fn normalize_connection(obj: &Map<String, Value>) -> Connection {
    Connection {
        source: text_or(obj, "source", ""),
        label: text_or(obj, "label", ""),
        kind: ConnectionType::from_name(&text_or(obj, "type", "solid")),
        color: sanitize_color(&text_or(obj, "color", DEFAULT_EDGE_COLOR)),
        width: width_value(obj.get("width")),
        arrow: !matches!(obj.get("arrow"), Some(Value::Bool(false))),
    }
}

/// Accepts a number or a numeric string; zero, absent or garbage reads as the default.
fn width_value(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(w) if w.is_finite() && w != 0.0 => {
            w.round()
                .clamp(f64::from(MIN_EDGE_WIDTH), f64::from(MAX_EDGE_WIDTH)) as u8
        }
        _ => DEFAULT_EDGE_WIDTH,
    }
}

/// Non-empty strings pass through, numbers are stringified, anything else takes `default`.
fn text_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn invalid(path: &str, expected: &'static str) -> ImportError {
    ImportError::InvalidField {
        field: path.to_string(),
        expected,
    }
}

fn object_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
) -> ImportResult<Option<&'a Map<String, Value>>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(invalid(&field_path(parent, key), "an object")),
    }
}

fn array_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
) -> ImportResult<Option<&'a Vec<Value>>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(invalid(&field_path(parent, key), "an array")),
    }
}
