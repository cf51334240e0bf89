//! Model to canvas: a full rebuild of every container, node and edge cell.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use sysflow_core::sanitize::sanitize_id;
use sysflow_core::{EditorConfig, Layout, Model, Node};

use crate::cell::{CellId, Geometry};
use crate::engine::{CanvasEngine, Result};
use crate::style::{edge_style, node_style, subgroup_style, system_style};

pub const SYSTEM_ORIGIN: (f64, f64) = (50.0, 50.0);
pub const SYSTEM_SPACING: f64 = 40.0;
pub const MIN_SYSTEM_WIDTH: f64 = 220.0;
pub const MIN_SYSTEM_HEIGHT: f64 = 150.0;
pub const SUBGROUP_EXTRA_HEIGHT: f64 = 100.0;
pub const NODE_WIDTH: f64 = 70.0;
pub const NODE_HEIGHT: f64 = 40.0;
pub const NODE_PADDING: f64 = 15.0;

/// View fitting applied after a rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasOptions {
    /// Padding kept around the children of a system container.
    pub group_padding: f64,
    pub fit_border: f64,
    pub max_scale: f64,
    pub min_scale: f64,
    /// Scale used when the fitted scale exceeds `max_scale`.
    pub zoom_down_to: f64,
    /// Scale used when the fitted scale falls below `min_scale`.
    pub zoom_up_to: f64,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            group_padding: 20.0,
            fit_border: 30.0,
            max_scale: 1.5,
            min_scale: 0.3,
            zoom_down_to: 1.2,
            zoom_up_to: 0.5,
        }
    }
}

impl CanvasOptions {
    pub fn from_config(config: &EditorConfig) -> Self {
        let d = Self::default();
        let get = |path: &str, fallback: f64| config.get_f64(path).unwrap_or(fallback);
        Self {
            group_padding: get("canvas.groupPadding", d.group_padding),
            fit_border: get("canvas.fitBorder", d.fit_border),
            max_scale: get("canvas.maxScale", d.max_scale),
            min_scale: get("canvas.minScale", d.min_scale),
            zoom_down_to: get("canvas.zoomDownTo", d.zoom_down_to),
            zoom_up_to: get("canvas.zoomUpTo", d.zoom_up_to),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub systems: usize,
    pub subgroups: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Connections left out because their source is unset or has no cell.
    pub skipped_edges: usize,
}

fn grid(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let cols = (count as f64).sqrt().ceil() as usize;
    (cols, count.div_ceil(cols))
}

fn system_size(node_count: usize, subgroup_count: usize) -> (f64, f64) {
    if node_count == 0 {
        return (MIN_SYSTEM_WIDTH, MIN_SYSTEM_HEIGHT);
    }
    let (cols, rows) = grid(node_count);
    let width = MIN_SYSTEM_WIDTH.max(cols as f64 * 90.0 + 60.0);
    let height = MIN_SYSTEM_HEIGHT.max(rows as f64 * 60.0 + 105.0)
        + subgroup_count as f64 * SUBGROUP_EXTRA_HEIGHT;
    (width, height)
}

/// Clears the engine and rebuilds it from `model`, then fits the view.
///
/// Insertions run inside one update batch; the batch is closed even when an insertion fails.
pub fn build_canvas<E: CanvasEngine + ?Sized>(
    engine: &mut E,
    model: &Model,
    options: &CanvasOptions,
) -> Result<BuildReport> {
    engine.clear();
    engine.begin_update();
    let populated = populate(engine, model);
    engine.end_update();
    let (report, system_cells) = populated?;

    for id in &system_cells {
        engine.update_group_bounds(id, options.group_padding)?;
    }
    engine.fit(options.fit_border);
    let scale = engine.scale();
    if scale > options.max_scale {
        engine.zoom_to(options.zoom_down_to);
    } else if scale < options.min_scale {
        engine.zoom_to(options.zoom_up_to);
    }
    tracing::debug!(
        systems = report.systems,
        nodes = report.nodes,
        edges = report.edges,
        scale = engine.scale(),
        "canvas rebuilt"
    );
    Ok(report)
}

fn populate<E: CanvasEngine + ?Sized>(
    engine: &mut E,
    model: &Model,
) -> Result<(BuildReport, Vec<CellId>)> {
    let root = engine.default_parent();
    let mut report = BuildReport::default();

    let mut sizes: FxHashMap<&str, (f64, f64)> = FxHashMap::default();
    for name in &model.systems_order {
        let Some(system) = model.systems.get(name) else {
            continue;
        };
        let node_count = model.nodes.iter().filter(|n| &n.system == name).count();
        sizes.insert(name, system_size(node_count, system.subgroups.len()));
    }

    let (mut x, mut y) = SYSTEM_ORIGIN;
    let mut system_cells: IndexMap<&str, CellId> = IndexMap::new();
    for (index, name) in model.systems_order.iter().enumerate() {
        let Some(system) = model.systems.get(name) else {
            continue;
        };
        let Some(&(width, height)) = sizes.get(name.as_str()) else {
            continue;
        };
        match model.placement.get(name).and_then(|p| p.x.zip(p.y)) {
            Some((sx, sy)) => {
                x = sx;
                y = sy;
            }
            None if index > 0 => {
                let prev = model.systems_order[index - 1].as_str();
                if let Some(&(pw, ph)) = sizes.get(prev) {
                    match model.arrangement {
                        Layout::Horizontal => x += pw + SYSTEM_SPACING,
                        Layout::Vertical => y += ph + SYSTEM_SPACING,
                    }
                }
            }
            None => {}
        }
        let id = engine.insert_vertex(
            &root,
            &sanitize_id(name),
            name,
            Geometry::new(x, y, width, height),
            &system_style(system),
        )?;
        system_cells.insert(name, id);
        report.systems += 1;
    }

    let mut node_cells: FxHashMap<&str, CellId> = FxHashMap::default();
    for (system_name, system_cell) in &system_cells {
        let Some(system) = model.systems.get(*system_name) else {
            continue;
        };
        let members: Vec<&Node> = model
            .nodes
            .iter()
            .filter(|n| n.system == *system_name)
            .collect();

        let mut current_y = 40.0;
        for (sg_name, sg) in &system.subgroups {
            let nodes: Vec<&Node> = members
                .iter()
                .copied()
                .filter(|n| &n.subgroup == sg_name)
                .collect();
            let (cols, rows) = grid(nodes.len());
            let width = 150f64.max(cols as f64 * 80.0 + 20.0);
            let height = 80f64.max(rows as f64 * 50.0 + 40.0);
            let sg_cell = engine.insert_vertex(
                system_cell,
                &sanitize_id(&format!("{system_name}_{sg_name}")),
                sg_name,
                Geometry::new(20.0, current_y, width, height),
                &subgroup_style(sg),
            )?;
            report.subgroups += 1;
            current_y += height + 20.0;
            place_grid(engine, &sg_cell, &nodes, 15.0, 35.0, &mut node_cells)?;
            report.nodes += nodes.len();
        }

        // no subgroup, or one that no longer exists
        let ungrouped: Vec<&Node> = members
            .iter()
            .copied()
            .filter(|n| !system.subgroups.contains_key(&n.subgroup))
            .collect();
        place_grid(
            engine,
            system_cell,
            &ungrouped,
            20.0,
            current_y + 35.0,
            &mut node_cells,
        )?;
        report.nodes += ungrouped.len();
    }

    let loose: Vec<&Node> = model
        .nodes
        .iter()
        .filter(|n| !system_cells.contains_key(n.system.as_str()))
        .collect();
    if !loose.is_empty() {
        let (lx, ly) = loose_origin(engine, model.arrangement, system_cells.values());
        place_grid(engine, &root, &loose, lx, ly, &mut node_cells)?;
        report.nodes += loose.len();
    }

    for node in &model.nodes {
        let Some(target) = node_cells.get(node.id.as_str()) else {
            report.skipped_edges += node.connections.len();
            continue;
        };
        for conn in &node.connections {
            let Some(source) = node_cells.get(conn.source.as_str()) else {
                report.skipped_edges += 1;
                continue;
            };
            engine.insert_edge(&root, None, &conn.label, source, target, &edge_style(conn))?;
            report.edges += 1;
        }
    }

    Ok((report, system_cells.into_values().collect()))
}

/// Lays nodes out in a square-ish grid of 70x40 cells.
fn place_grid<'m, E: CanvasEngine + ?Sized>(
    engine: &mut E,
    parent: &str,
    nodes: &[&'m Node],
    start_x: f64,
    start_y: f64,
    node_cells: &mut FxHashMap<&'m str, CellId>,
) -> Result<()> {
    let (per_row, _) = grid(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        let row = idx / per_row;
        let col = idx % per_row;
        let geometry = Geometry::new(
            start_x + col as f64 * (NODE_WIDTH + NODE_PADDING),
            start_y + row as f64 * (NODE_HEIGHT + NODE_PADDING),
            NODE_WIDTH,
            NODE_HEIGHT,
        );
        let id = engine.insert_vertex(
            parent,
            &node.id,
            node.display_label(),
            geometry,
            &node_style(node),
        )?;
        node_cells.insert(node.id.as_str(), id);
    }
    Ok(())
}

/// Where nodes without a system go: past the last system in the arrangement direction.
fn loose_origin<'a, E: CanvasEngine + ?Sized>(
    engine: &E,
    arrangement: Layout,
    system_cells: impl Iterator<Item = &'a CellId>,
) -> (f64, f64) {
    let geometries: Vec<Geometry> = system_cells.filter_map(|id| engine.geometry(id)).collect();
    if geometries.is_empty() {
        return SYSTEM_ORIGIN;
    }
    match arrangement {
        Layout::Horizontal => {
            let right = geometries.iter().map(Geometry::right).fold(f64::MIN, f64::max);
            (right + SYSTEM_SPACING, SYSTEM_ORIGIN.1)
        }
        Layout::Vertical => {
            let bottom = geometries.iter().map(Geometry::bottom).fold(f64::MIN, f64::max);
            (SYSTEM_ORIGIN.0, bottom + SYSTEM_SPACING)
        }
    }
}
