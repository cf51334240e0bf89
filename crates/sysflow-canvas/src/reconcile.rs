//! Canvas to model: re-absorbs user edits made directly on the canvas.
//!
//! [`reconcile`] derives system order, node membership and connections from the current
//! cells. Connections are rebuilt from scratch out of the edge cells, so a connection with
//! no edge on the canvas (e.g. one without a source) does not survive a reconcile pass.
//! [`apply_label_change`] handles in-place label edits, which may rename systems.

use rustc_hash::FxHashMap;
use sysflow_core::sanitize::sanitize_id;
use sysflow_core::{EditError, Layout, Model, SubgroupStyle};

use crate::cell::Cell;
use crate::engine::CanvasEngine;
use crate::style::connection_from_edge_style;

/// A node whose container changed on the canvas. Empty strings mean "none".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub node: String,
    pub system: String,
    pub subgroup: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// The system order changed; list views need a re-render.
    pub order_changed: bool,
    /// Nodes whose system/subgroup selectors need updating.
    pub reassigned: Vec<Reassignment>,
    /// Connections after the rebuild.
    pub connections: usize,
}

/// Container ids of the current model, keyed by cell id.
struct Containers<'m> {
    systems: FxHashMap<String, &'m str>,
    subgroups: FxHashMap<String, (&'m str, &'m str)>,
}

impl<'m> Containers<'m> {
    fn of(model: &'m Model) -> Self {
        let mut systems = FxHashMap::default();
        let mut subgroups = FxHashMap::default();
        for (name, system) in &model.systems {
            systems.insert(sanitize_id(name), name.as_str());
            for sg in system.subgroups.keys() {
                subgroups.insert(
                    sanitize_id(&format!("{name}_{sg}")),
                    (name.as_str(), sg.as_str()),
                );
            }
        }
        Self { systems, subgroups }
    }
}

pub fn reconcile<E: CanvasEngine + ?Sized>(engine: &E, model: &mut Model) -> ReconcileReport {
    let cells = engine.cells();
    let order_changed = sync_system_order(engine, model);
    let reassigned = sync_node_parents(engine, &cells, model);
    let connections = sync_edges(&cells, model);
    ReconcileReport {
        order_changed,
        reassigned,
        connections,
    }
}

/// Stores each system container's geometry and re-sorts systems by position.
///
/// Systems without a container cell keep their relative order after the placed ones.
fn sync_system_order<E: CanvasEngine + ?Sized>(engine: &E, model: &mut Model) -> bool {
    let mut positioned: Vec<(String, f64)> = Vec::new();
    let mut unplaced: Vec<String> = Vec::new();
    for name in model.systems_order.clone() {
        match engine.geometry(&sanitize_id(&name)) {
            Some(geo) => {
                model.save_geometry(&name, geo.x, geo.y, geo.width, geo.height);
                let key = match model.arrangement {
                    Layout::Horizontal => geo.x,
                    Layout::Vertical => geo.y,
                };
                positioned.push((name, key));
            }
            None => unplaced.push(name),
        }
    }
    positioned.sort_by(|a, b| a.1.total_cmp(&b.1));

    let candidate: Vec<String> = positioned
        .into_iter()
        .map(|(name, _)| name)
        .chain(unplaced)
        .collect();
    if candidate == model.systems_order {
        return false;
    }
    tracing::debug!(order = ?candidate, "system order changed on canvas");
    model.apply_list_order_to_placement(&candidate);
    true
}

fn sync_node_parents<E: CanvasEngine + ?Sized>(
    engine: &E,
    cells: &[Cell],
    model: &mut Model,
) -> Vec<Reassignment> {
    let root = engine.default_parent();
    let mut moves = Vec::new();
    {
        let containers = Containers::of(model);
        for cell in cells.iter().filter(|c| c.is_vertex()) {
            let Some(node) = model.node(&cell.id) else {
                continue;
            };
            let (system, subgroup) = if cell.parent == root {
                ("", "")
            } else if let Some(system) = containers.systems.get(&cell.parent) {
                (*system, "")
            } else if let Some((system, sg)) = containers.subgroups.get(&cell.parent) {
                (*system, *sg)
            } else {
                continue;
            };
            if node.system != system || node.subgroup != subgroup {
                moves.push(Reassignment {
                    node: node.id.clone(),
                    system: system.to_string(),
                    subgroup: subgroup.to_string(),
                });
            }
        }
    }

    for r in &moves {
        if let Some(node) = model.node_mut(&r.node) {
            node.system = r.system.clone();
            node.subgroup = r.subgroup.clone();
        }
        tracing::debug!(
            node = %r.node,
            system = %r.system,
            subgroup = %r.subgroup,
            "node re-parented on canvas"
        );
    }
    moves
}

/// Replaces every node's connections with the ones drawn as edges between node cells.
fn sync_edges(cells: &[Cell], model: &mut Model) -> usize {
    for node in &mut model.nodes {
        node.connections.clear();
    }
    let mut count = 0;
    for cell in cells.iter().filter(|c| c.is_edge()) {
        let (Some(source), Some(target)) = (cell.source.as_deref(), cell.target.as_deref()) else {
            continue;
        };
        if model.node(source).is_none() {
            continue;
        }
        let Some(node) = model.node_mut(target) else {
            continue;
        };
        node.connections
            .push(connection_from_edge_style(source, &cell.value, &cell.style));
        count += 1;
    }
    count
}

/// What an in-place label edit did to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    SystemRenamed { old: String, new: String },
    SubgroupRenamed {
        system: String,
        old: String,
        new: String,
    },
    NodeRelabeled { id: String },
    /// The edit was rejected silently (e.g. an emptied container name) and the label restored.
    Reverted,
    /// The cell is not a system, subgroup or node, or the label did not change.
    Ignored,
}

/// Applies a label edit made on `cell`. A rejected rename restores the previous label on the
/// canvas and returns the validation error.
pub fn apply_label_change<E: CanvasEngine + ?Sized>(
    engine: &mut E,
    model: &mut Model,
    cell: &str,
    value: &str,
) -> Result<LabelChange, EditError> {
    let (system, subgroup) = {
        let containers = Containers::of(model);
        if let Some(system) = containers.systems.get(cell) {
            (Some(system.to_string()), None)
        } else if let Some((system, sg)) = containers.subgroups.get(cell) {
            (Some(system.to_string()), Some(sg.to_string()))
        } else {
            (None, None)
        }
    };
    match (system, subgroup) {
        (Some(system), None) => return rename_system_cell(engine, model, cell, &system, value),
        (Some(system), Some(sg)) => {
            return rename_subgroup_cell(engine, model, cell, &system, &sg, value);
        }
        _ => {}
    }

    if model.node(cell).is_some() {
        model.set_node_label(cell, value)?;
        return Ok(LabelChange::NodeRelabeled {
            id: cell.to_string(),
        });
    }
    Ok(LabelChange::Ignored)
}

fn rename_system_cell<E: CanvasEngine + ?Sized>(
    engine: &mut E,
    model: &mut Model,
    cell: &str,
    old: &str,
    value: &str,
) -> Result<LabelChange, EditError> {
    let new = value.trim();
    if new.is_empty() {
        restore_label(engine, cell, old);
        return Ok(LabelChange::Reverted);
    }
    if new == old {
        return Ok(LabelChange::Ignored);
    }
    if let Err(err) = model.rename_system(old, new) {
        tracing::warn!(system = %old, requested = %new, error = %err, "system rename reverted");
        restore_label(engine, cell, old);
        return Err(err);
    }

    rename_cell_id(engine, cell, &sanitize_id(new));
    let subgroups: Vec<String> = model
        .system(new)
        .map(|s| s.subgroups.keys().cloned().collect())
        .unwrap_or_default();
    for sg in subgroups {
        rename_cell_id(
            engine,
            &sanitize_id(&format!("{old}_{sg}")),
            &sanitize_id(&format!("{new}_{sg}")),
        );
    }
    Ok(LabelChange::SystemRenamed {
        old: old.to_string(),
        new: new.to_string(),
    })
}

fn rename_subgroup_cell<E: CanvasEngine + ?Sized>(
    engine: &mut E,
    model: &mut Model,
    cell: &str,
    system: &str,
    old: &str,
    value: &str,
) -> Result<LabelChange, EditError> {
    let new = value.trim();
    if new.is_empty() {
        restore_label(engine, cell, old);
        return Ok(LabelChange::Reverted);
    }
    if new == old {
        return Ok(LabelChange::Ignored);
    }
    let style = model
        .system(system)
        .and_then(|s| s.subgroups.get(old))
        .map(|sg| SubgroupStyle {
            layout: sg.layout,
            fill: sg.fill.clone(),
            stroke: sg.stroke.clone(),
        })
        .unwrap_or_default();
    if let Err(err) = model.update_subgroup(system, old, new, &style) {
        tracing::warn!(
            system = %system,
            subgroup = %old,
            requested = %new,
            error = %err,
            "subgroup rename reverted"
        );
        restore_label(engine, cell, old);
        return Err(err);
    }
    rename_cell_id(engine, cell, &sanitize_id(&format!("{system}_{new}")));
    Ok(LabelChange::SubgroupRenamed {
        system: system.to_string(),
        old: old.to_string(),
        new: new.to_string(),
    })
}

fn restore_label<E: CanvasEngine + ?Sized>(engine: &mut E, cell: &str, label: &str) {
    if let Err(err) = engine.set_value(cell, label) {
        tracing::warn!(cell = %cell, error = %err, "could not restore canvas label");
    }
}

fn rename_cell_id<E: CanvasEngine + ?Sized>(engine: &mut E, id: &str, new_id: &str) {
    if id == new_id || engine.cell(id).is_none() {
        return;
    }
    if let Err(err) = engine.rename_cell(id, new_id) {
        tracing::warn!(cell = %id, new_id = %new_id, error = %err, "could not rename canvas cell");
    }
}
