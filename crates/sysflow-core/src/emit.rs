//! Model to Mermaid `graph` source.
//!
//! Output is a pure function of the model and [`EmitOptions`]: systems come out in
//! `systems_order`, node groups in first-appearance order, edges in node/connection order,
//! and style declarations in mapping order.

use indexmap::IndexMap;

use crate::config::EditorConfig;
use crate::model::{Connection, LinePattern, Model, Node, Subgroup, System, clamp_width};
use crate::sanitize::{escape_label, is_strict_hex_color, sanitize_color, sanitize_id};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Suppresses every `linkStyle` line.
    pub safe_mode: bool,
}

impl EmitOptions {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            safe_mode: config.get_bool("edgeStyle.safeMode").unwrap_or_default(),
        }
    }
}

/// What happened to the per-edge `linkStyle` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStyleStatus {
    Emitted,
    SafeMode,
    /// The whole block was dropped; indexes are the offending edges.
    Dropped { corrupt_edges: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MermaidSource {
    pub text: String,
    pub edge_count: usize,
    pub link_styles: LinkStyleStatus,
}

const NO_GROUP: &str = "";

pub fn to_mermaid(model: &Model, options: &EmitOptions) -> String {
    emit_mermaid(model, options).text
}

pub fn emit_mermaid(model: &Model, options: &EmitOptions) -> MermaidSource {
    let mut groups: IndexMap<&str, IndexMap<&str, Vec<String>>> = IndexMap::new();
    for node in &model.nodes {
        if node.system.is_empty() || !model.systems.contains_key(&node.system) {
            continue;
        }
        groups
            .entry(node.system.as_str())
            .or_default()
            .entry(node.subgroup.as_str())
            .or_default()
            .push(node_line(node));
    }

    let mut lines: Vec<String> = vec![
        format!("graph {}", model.arrangement.graph_direction()),
        String::new(),
    ];

    let empty = IndexMap::new();
    for name in &model.systems_order {
        let Some(system) = model.systems.get(name) else {
            continue;
        };
        let node_groups = groups.get(name.as_str()).unwrap_or(&empty);
        emit_system(&mut lines, name, system, node_groups);
    }

    let mut edge_lines = Vec::new();
    let mut node_style_lines = Vec::new();
    let mut link_style_lines = Vec::new();

    for node in &model.nodes {
        node_style_lines.push(format!(
            "style {} fill:{},stroke:{},stroke-width:2px,color:{}",
            node.id,
            sanitize_color(&node.bg_color),
            sanitize_color(&node.outline_color),
            sanitize_color(&node.text_color),
        ));
        for conn in &node.connections {
            if conn.is_dangling() {
                continue;
            }
            let idx = edge_lines.len();
            edge_lines.push(edge_line(conn, &node.id));
            if !options.safe_mode {
                link_style_lines.push(link_style_line(idx, conn));
            }
        }
    }

    if !edge_lines.is_empty() {
        lines.push(String::new());
        lines.extend(edge_lines.iter().cloned());
    }
    if !node_style_lines.is_empty() {
        lines.push(String::new());
        lines.append(&mut node_style_lines);
    }

    for (name, system) in &model.systems {
        lines.push(container_style(&sanitize_id(name), &system.fill, &system.stroke));
        for (sg, cfg) in &system.subgroups {
            lines.push(container_style(
                &sanitize_id(&format!("{name}_{sg}")),
                &cfg.fill,
                &cfg.stroke,
            ));
        }
    }

    let (mut link_style_lines, link_styles) = if options.safe_mode {
        (Vec::new(), LinkStyleStatus::SafeMode)
    } else {
        guard_link_styles(link_style_lines)
    };

    if !link_style_lines.is_empty() {
        lines.push(String::new());
        lines.append(&mut link_style_lines);
    }

    MermaidSource {
        text: lines.join("\n"),
        edge_count: edge_lines.len(),
        link_styles,
    }
}

fn emit_system(
    lines: &mut Vec<String>,
    name: &str,
    system: &System,
    node_groups: &IndexMap<&str, Vec<String>>,
) {
    let base_id = sanitize_id(name);
    lines.push(format!("%% SYSTEM START: {base_id}"));
    lines.push(format!("subgraph {base_id}[\"{}\"]", escape_label(name)));
    lines.push(format!("direction {}", system.layout.subgraph_direction()));

    let fallback = Subgroup::default();
    for (&sg, items) in node_groups {
        if items.is_empty() {
            continue;
        }
        if sg == NO_GROUP {
            lines.extend(items.iter().cloned());
            continue;
        }
        let cfg = system.subgroups.get(sg).unwrap_or(&fallback);
        lines.push(format!(
            "subgraph {}[\"{}\"]",
            sanitize_id(&format!("{name}_{sg}")),
            escape_label(sg)
        ));
        lines.push(format!("direction {}", cfg.layout.subgraph_direction()));
        lines.extend(items.iter().cloned());
        lines.push("end".to_string());
    }

    lines.push("end".to_string());
    lines.push(format!("%% SYSTEM END: {base_id}"));
    lines.push(String::new());
}

pub fn node_line(node: &Node) -> String {
    let quoted = format!("\"{}\"", escape_label(node.display_label()));
    format!("{}{}", node.id, node.shape.wrap(&quoted))
}

/// `source OP[|label|] target`.
pub fn edge_line(conn: &Connection, target: &str) -> String {
    let label = if conn.label.is_empty() {
        String::new()
    } else {
        format!("|{}|", escape_label(&conn.label))
    };
    format!("{} {}{} {}", conn.source, conn.operator(), label, target)
}

/// Builds the `linkStyle` line for edge `idx`, returning it with the color it embeds.
pub fn link_style_line(idx: usize, conn: &Connection) -> (String, String) {
    let color = sanitize_color(if conn.color.is_empty() {
        crate::model::DEFAULT_EDGE_COLOR
    } else {
        &conn.color
    });
    let mut width = clamp_width(conn.width);
    let mut dash = None;
    match conn.kind.style().pattern {
        LinePattern::Dotted => dash = Some("2 4"),
        LinePattern::Double => {
            width = width.max(4);
            dash = Some("4 2");
        }
        LinePattern::Solid | LinePattern::Dashed => {}
    }
    let mut line = format!("linkStyle {idx} stroke:{color},stroke-width:{width}px");
    if let Some(dash) = dash {
        line.push_str(",stroke-dasharray:");
        line.push_str(dash);
    }
    line.push(';');
    (line, color)
}

/// Checks a pass's `(line, color)` pairs, given in edge order. Any corrupt line drops the whole
/// block for this pass.
pub fn guard_link_styles(styles: Vec<(String, String)>) -> (Vec<String>, LinkStyleStatus) {
    let corrupt_edges: Vec<usize> = styles
        .iter()
        .enumerate()
        .filter(|(_, (line, color))| is_corrupt_link_style(line, color))
        .map(|(idx, _)| idx)
        .collect();
    if !corrupt_edges.is_empty() {
        tracing::warn!(
            edges = ?corrupt_edges,
            "corrupt linkStyle line; dropping the linkStyle block for this pass"
        );
        return (Vec::new(), LinkStyleStatus::Dropped { corrupt_edges });
    }
    let lines = styles.into_iter().map(|(line, _)| line).collect();
    (lines, LinkStyleStatus::Emitted)
}

/// A style line is corrupt when it leaves printable ASCII or its color is not `#rrggbb`.
pub fn is_corrupt_link_style(line: &str, color: &str) -> bool {
    !line.chars().all(|ch| matches!(ch, ' '..='~')) || !is_strict_hex_color(color)
}

fn container_style(id: &str, fill: &str, stroke: &str) -> String {
    format!(
        "style {id} fill:{},stroke:{},stroke-width:2px",
        sanitize_color(fill),
        sanitize_color(stroke)
    )
}
