//! The editable diagram model: systems, subgroups, nodes and their incoming connections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::sanitize::{escape_label, sanitize_color};

pub const DEFAULT_SYSTEM_STROKE: &str = "#333333";
pub const DEFAULT_SYSTEM_FILL: &str = "#ffffff";
pub const DEFAULT_SUBGROUP_FILL: &str = "#eef5ff";
pub const DEFAULT_SUBGROUP_STROKE: &str = "#9dbce6";
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_BG_COLOR: &str = "#ffffff";
pub const DEFAULT_OUTLINE_COLOR: &str = "#333333";
pub const DEFAULT_EDGE_COLOR: &str = "#333333";
pub const DEFAULT_EDGE_WIDTH: u8 = 2;
pub const MIN_EDGE_WIDTH: u8 = 1;
pub const MAX_EDGE_WIDTH: u8 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Vertical,
    Horizontal,
}

impl Layout {
    /// Anything other than `"horizontal"` reads as vertical.
    pub fn from_name(name: &str) -> Self {
        if name.trim() == "horizontal" {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }

    /// Direction keyword used inside a subgraph.
    pub fn subgraph_direction(self) -> &'static str {
        match self {
            Self::Horizontal => "LR",
            Self::Vertical => "TB",
        }
    }

    /// Direction keyword used by the top-level graph header.
    pub fn graph_direction(self) -> &'static str {
        match self {
            Self::Horizontal => "LR",
            Self::Vertical => "TD",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Rect,
    Round,
    Stadium,
    Subroutine,
    Cylinder,
    Circle,
    Diamond,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::Rect,
        Shape::Round,
        Shape::Stadium,
        Shape::Subroutine,
        Shape::Cylinder,
        Shape::Circle,
        Shape::Diamond,
    ];

    /// Unknown names fall back to [`Shape::Rect`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == name.trim())
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Round => "round",
            Self::Stadium => "stadium",
            Self::Subroutine => "subroutine",
            Self::Cylinder => "cylinder",
            Self::Circle => "circle",
            Self::Diamond => "diamond",
        }
    }

    /// Wraps already-quoted label text in this shape's bracket syntax.
    pub fn wrap(self, text: &str) -> String {
        match self {
            Self::Circle => format!("(({text}))"),
            Self::Diamond => format!("{{{text}}}"),
            Self::Subroutine => format!("[[{text}]]"),
            Self::Stadium => format!("([{text}])"),
            Self::Round | Self::Cylinder => format!("({text})"),
            Self::Rect => format!("[{text}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePattern {
    Solid,
    Dashed,
    Dotted,
    Double,
}

/// Operator pair and stroke pattern for one [`ConnectionType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeStyleDef {
    pub arrow_op: &'static str,
    pub no_arrow_op: &'static str,
    pub pattern: LinePattern,
    pub force_no_arrow: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionType {
    #[default]
    Solid,
    Plain,
    Dashed,
    DashedNo,
    Dotted,
    DottedNo,
    Thick,
    ThickNo,
    Double,
    None,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 10] = [
        ConnectionType::Solid,
        ConnectionType::Plain,
        ConnectionType::Dashed,
        ConnectionType::DashedNo,
        ConnectionType::Dotted,
        ConnectionType::DottedNo,
        ConnectionType::Thick,
        ConnectionType::ThickNo,
        ConnectionType::Double,
        ConnectionType::None,
    ];

    /// Strict lookup; `None` for names outside the ten known types.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Unknown names fall back to [`ConnectionType::Solid`].
    pub fn from_name(name: &str) -> Self {
        Self::parse(name.trim()).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Plain => "plain",
            Self::Dashed => "dashed",
            Self::DashedNo => "dashedNo",
            Self::Dotted => "dotted",
            Self::DottedNo => "dottedNo",
            Self::Thick => "thick",
            Self::ThickNo => "thickNo",
            Self::Double => "double",
            Self::None => "none",
        }
    }

    pub fn style(self) -> EdgeStyleDef {
        let (arrow_op, no_arrow_op, pattern, force_no_arrow) = match self {
            Self::Solid => ("-->", "---", LinePattern::Solid, false),
            Self::Plain => ("-->", "---", LinePattern::Solid, true),
            Self::Dashed => ("-.->", "-.-", LinePattern::Dashed, false),
            Self::DashedNo => ("-.->", "-.-", LinePattern::Dashed, true),
            Self::Dotted => ("-->", "---", LinePattern::Dotted, false),
            Self::DottedNo => ("-->", "---", LinePattern::Dotted, true),
            Self::Thick => ("==>", "===", LinePattern::Solid, false),
            Self::ThickNo => ("==>", "===", LinePattern::Solid, true),
            Self::Double => ("==>", "===", LinePattern::Double, false),
            Self::None => ("---", "---", LinePattern::Solid, true),
        };
        EdgeStyleDef {
            arrow_op,
            no_arrow_op,
            pattern,
            force_no_arrow,
        }
    }
}

/// An incoming edge; the node holding it is the implicit target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Source node id; `""` marks an edge still waiting for user input.
    pub source: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ConnectionType,
    pub color: String,
    pub width: u8,
    pub arrow: bool,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            source: String::new(),
            label: String::new(),
            kind: ConnectionType::Solid,
            color: DEFAULT_EDGE_COLOR.to_string(),
            width: DEFAULT_EDGE_WIDTH,
            arrow: true,
        }
    }
}

impl Connection {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn is_dangling(&self) -> bool {
        self.source.is_empty()
    }

    /// Whether the rendered edge carries an arrow head.
    pub fn has_arrow(&self) -> bool {
        self.arrow && !self.kind.style().force_no_arrow
    }

    pub fn operator(&self) -> &'static str {
        let def = self.kind.style();
        if self.has_arrow() {
            def.arrow_op
        } else {
            def.no_arrow_op
        }
    }

    /// Copy with color sanitized and width clamped into `1..=6` (0 reads as unset).
    pub fn normalized(mut self) -> Self {
        self.color = sanitize_color(&self.color);
        self.width = clamp_width(self.width);
        self
    }
}

pub fn clamp_width(width: u8) -> u8 {
    if width == 0 {
        DEFAULT_EDGE_WIDTH
    } else {
        width.clamp(MIN_EDGE_WIDTH, MAX_EDGE_WIDTH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: Shape,
    pub text_color: String,
    pub bg_color: String,
    pub outline_color: String,
    /// Owning system name, `""` when the node sits at the root.
    pub system: String,
    pub subgroup: String,
    pub desc: String,
    pub connections: Vec<Connection>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            shape: Shape::Rect,
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            outline_color: DEFAULT_OUTLINE_COLOR.to_string(),
            system: String::new(),
            subgroup: String::new(),
            desc: String::new(),
            connections: Vec::new(),
        }
    }

    /// The label, or the id when the label is empty.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.system.is_empty()
    }
}

/// Form-shaped style input for creating or updating a system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStyle {
    pub layout: Layout,
    pub fill: String,
    pub stroke: String,
}

impl Default for SystemStyle {
    fn default() -> Self {
        Self {
            layout: Layout::Vertical,
            fill: DEFAULT_SYSTEM_FILL.to_string(),
            stroke: DEFAULT_SYSTEM_STROKE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgroupStyle {
    pub layout: Layout,
    pub fill: String,
    pub stroke: String,
}

impl Default for SubgroupStyle {
    fn default() -> Self {
        Self {
            layout: Layout::Vertical,
            fill: DEFAULT_SUBGROUP_FILL.to_string(),
            stroke: DEFAULT_SUBGROUP_STROKE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgroup {
    pub layout: Layout,
    pub fill: String,
    pub stroke: String,
}

impl Default for Subgroup {
    fn default() -> Self {
        Self::from_style(&SubgroupStyle::default())
    }
}

impl Subgroup {
    pub fn from_style(style: &SubgroupStyle) -> Self {
        Self {
            layout: style.layout,
            fill: sanitize_color(&style.fill),
            stroke: sanitize_color(&style.stroke),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub stroke: String,
    pub fill: String,
    pub layout: Layout,
    #[serde(default)]
    pub subgroups: IndexMap<String, Subgroup>,
}

impl Default for System {
    fn default() -> Self {
        Self::from_style(&SystemStyle::default())
    }
}

impl System {
    pub fn from_style(style: &SystemStyle) -> Self {
        Self {
            stroke: sanitize_color(&style.stroke),
            fill: sanitize_color(&style.fill),
            layout: style.layout,
            subgroups: IndexMap::new(),
        }
    }

    pub fn apply_style(&mut self, style: &SystemStyle) {
        self.stroke = sanitize_color(&style.stroke);
        self.fill = sanitize_color(&style.fill);
        self.layout = style.layout;
    }
}

/// Persisted order and last-known canvas geometry of one system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Placement {
    pub fn at(order: usize) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    pub fn clear_geometry(&mut self) {
        self.x = None;
        self.y = None;
        self.width = None;
        self.height = None;
    }
}

/// Every system/subgroup name sharing one sanitized id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCollision {
    pub id: String,
    pub names: Vec<String>,
}

/// The whole editable document.
///
/// Mutation goes through the methods in `edit.rs` and `placement.rs`, which keep the cross
/// references (`systems_order`, `placement`, `Node::system`) consistent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub systems: IndexMap<String, System>,
    pub systems_order: Vec<String>,
    pub arrangement: Layout,
    pub legend: String,
    pub placement: IndexMap<String, Placement>,
    pub nodes: Vec<Node>,
    pub(crate) node_counter: u64,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number the next `add_node` will use (`N{counter}`).
    pub fn node_counter(&self) -> u64 {
        self.node_counter
    }

    /// Recomputes the id counter as one past the largest `N<digits>` id (0 if none).
    pub fn recompute_node_counter(&mut self) {
        self.node_counter = next_node_counter(&self.nodes);
    }

    pub fn system(&self, name: &str) -> Option<&System> {
        self.systems.get(name)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn has_subgroup(&self, system: &str, subgroup: &str) -> bool {
        self.systems
            .get(system)
            .is_some_and(|s| s.subgroups.contains_key(subgroup))
    }

    /// Subgroup names of `system` in mapping order; empty for an unknown system.
    pub fn subgroup_options(&self, system: &str) -> Vec<String> {
        self.systems
            .get(system)
            .map(|s| s.subgroups.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// `(id, escaped display label)` for every node other than `target`.
    pub fn source_options(&self, target: &str) -> Vec<(String, String)> {
        self.nodes
            .iter()
            .filter(|n| n.id != target)
            .map(|n| (n.id.clone(), escape_label(n.display_label())))
            .collect()
    }

    /// System names, and composite `system_subgroup` names, that sanitize to a shared id.
    pub fn sanitized_id_collisions(&self) -> Vec<IdCollision> {
        let mut by_id: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, system) in &self.systems {
            by_id
                .entry(crate::sanitize::sanitize_id(name))
                .or_default()
                .push(name.clone());
            for sg in system.subgroups.keys() {
                let composite = format!("{name}_{sg}");
                by_id
                    .entry(crate::sanitize::sanitize_id(&composite))
                    .or_default()
                    .push(composite);
            }
        }
        by_id
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(id, names)| IdCollision { id, names })
            .collect()
    }
}

pub(crate) fn next_node_counter(nodes: &[Node]) -> u64 {
    nodes
        .iter()
        .filter_map(|n| {
            let digits = n.id.strip_prefix('N')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u64>().ok()
        })
        .max()
        .map_or(0, |max| max.saturating_add(1))
}
