//! A headless [`CanvasEngine`] that keeps cells in memory.
//!
//! Besides the engine operations it offers the gestures a user would perform on a real
//! surface (move, resize, connect, delete, edit label). Those queue [`CanvasEvent`]s which
//! callers drain with [`CanvasEngine::take_events`].

use indexmap::IndexMap;

use crate::cell::{Bounds, Cell, CellId, CellKind, Geometry};
use crate::engine::{CanvasEngine, CanvasError, CanvasEvent, Result};

/// Id of the layer that holds top-level cells.
pub const ROOT_LAYER: &str = "1";

const DEFAULT_VIEWPORT: (f64, f64) = (1200.0, 800.0);

#[derive(Debug, Clone)]
pub struct MemoryCanvas {
    cells: IndexMap<CellId, Cell>,
    scale: f64,
    translate: (f64, f64),
    viewport: (f64, f64),
    update_depth: usize,
    pending: Vec<CanvasEvent>,
    events: Vec<CanvasEvent>,
    next_edge_id: u64,
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCanvas {
    pub fn new() -> Self {
        Self::with_viewport(DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1)
    }

    pub fn with_viewport(width: f64, height: f64) -> Self {
        Self {
            cells: IndexMap::new(),
            scale: 1.0,
            translate: (0.0, 0.0),
            viewport: (width, height),
            update_depth: 0,
            pending: Vec::new(),
            events: Vec::new(),
            next_edge_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn translate(&self) -> (f64, f64) {
        self.translate
    }

    pub fn children(&self, parent: &str) -> Vec<&Cell> {
        self.cells.values().filter(|c| c.parent == parent).collect()
    }

    /// Geometry in layer coordinates (parent offsets summed up).
    pub fn absolute_geometry(&self, id: &str) -> Option<Geometry> {
        let cell = self.cells.get(id)?;
        let mut geo = cell.geometry?;
        let mut parent = cell.parent.as_str();
        while let Some(p) = self.cells.get(parent) {
            if let Some(pg) = p.geometry {
                geo = geo.translated(pg.x, pg.y);
            }
            parent = p.parent.as_str();
        }
        Some(geo)
    }

    /// Drags a cell by `(dx, dy)` within its parent.
    pub fn move_cell(&mut self, id: &str, dx: f64, dy: f64) -> Result<()> {
        let cell = self.cell_mut(id)?;
        if let Some(geo) = cell.geometry.as_mut() {
            *geo = geo.translated(dx, dy);
        }
        self.emit(CanvasEvent::CellsMoved {
            cells: vec![id.to_string()],
        });
        Ok(())
    }

    /// Drops a cell into another container (or the layer) at `geometry`.
    pub fn move_cell_into(&mut self, id: &str, parent: &str, geometry: Geometry) -> Result<()> {
        self.check_parent(parent)?;
        if self.is_self_or_ancestor(id, parent) {
            return Err(CanvasError::UnknownParent {
                id: parent.to_string(),
            });
        }
        let cell = self.cell_mut(id)?;
        cell.parent = parent.to_string();
        cell.geometry = Some(geometry);
        self.emit(CanvasEvent::CellsMoved {
            cells: vec![id.to_string()],
        });
        Ok(())
    }

    pub fn resize_cell(&mut self, id: &str, geometry: Geometry) -> Result<()> {
        self.cell_mut(id)?.geometry = Some(geometry);
        self.emit(CanvasEvent::CellsResized {
            cells: vec![id.to_string()],
        });
        Ok(())
    }

    /// Draws a new edge between two vertices.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        value: &str,
        style: &str,
    ) -> Result<CellId> {
        let id = self.insert_edge_quiet(ROOT_LAYER, None, value, source, target, style)?;
        self.emit(CanvasEvent::CellConnected { edge: id.clone() });
        Ok(id)
    }

    /// Deletes cells with their descendants and every edge attached to any of them.
    pub fn remove_cells(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            if !self.cells.contains_key(*id) {
                return Err(CanvasError::UnknownCell { id: id.to_string() });
            }
        }
        let mut doomed: Vec<CellId> = ids.iter().map(|s| s.to_string()).collect();
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i].clone();
            for cell in self.cells.values() {
                let attached = cell.parent == current
                    || cell.source.as_deref() == Some(current.as_str())
                    || cell.target.as_deref() == Some(current.as_str());
                if attached && !doomed.contains(&cell.id) {
                    doomed.push(cell.id.clone());
                }
            }
            i += 1;
        }
        self.cells.retain(|id, _| !doomed.contains(id));
        self.emit(CanvasEvent::CellsRemoved { cells: doomed });
        Ok(())
    }

    /// In-place label edit; returns the event it queued.
    pub fn edit_label(&mut self, id: &str, value: &str) -> Result<CanvasEvent> {
        let cell = self.cell_mut(id)?;
        let old = std::mem::replace(&mut cell.value, value.to_string());
        let event = CanvasEvent::LabelChanged {
            cell: id.to_string(),
            value: value.to_string(),
            old,
        };
        self.emit(event.clone());
        Ok(event)
    }

    fn cell_mut(&mut self, id: &str) -> Result<&mut Cell> {
        self.cells
            .get_mut(id)
            .ok_or_else(|| CanvasError::UnknownCell { id: id.to_string() })
    }

    fn check_parent(&self, parent: &str) -> Result<()> {
        if parent == ROOT_LAYER || self.cells.get(parent).is_some_and(Cell::is_vertex) {
            Ok(())
        } else {
            Err(CanvasError::UnknownParent {
                id: parent.to_string(),
            })
        }
    }

    fn is_self_or_ancestor<'a>(&'a self, id: &str, mut cursor: &'a str) -> bool {
        loop {
            if cursor == id {
                return true;
            }
            match self.cells.get(cursor) {
                Some(c) => cursor = c.parent.as_str(),
                None => return false,
            }
        }
    }

    fn insert_edge_quiet(
        &mut self,
        parent: &str,
        id: Option<&str>,
        value: &str,
        source: &str,
        target: &str,
        style: &str,
    ) -> Result<CellId> {
        self.check_parent(parent)?;
        for end in [source, target] {
            if !self.cells.get(end).is_some_and(Cell::is_vertex) {
                return Err(CanvasError::MissingEndpoint { id: end.to_string() });
            }
        }
        let id = match id {
            Some(id) => {
                if self.cells.contains_key(id) {
                    return Err(CanvasError::DuplicateCell { id: id.to_string() });
                }
                id.to_string()
            }
            None => loop {
                let candidate = format!("e{}", self.next_edge_id);
                self.next_edge_id += 1;
                if !self.cells.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        self.cells.insert(
            id.clone(),
            Cell {
                id: id.clone(),
                kind: CellKind::Edge,
                value: value.to_string(),
                parent: parent.to_string(),
                style: style.to_string(),
                geometry: None,
                source: Some(source.to_string()),
                target: Some(target.to_string()),
            },
        );
        Ok(id)
    }

    fn emit(&mut self, event: CanvasEvent) {
        if self.update_depth > 0 {
            self.pending.push(event);
        } else {
            self.events.push(event);
        }
    }

    /// Folds a finished batch into one event per list-carrying kind.
    fn flush_batch(&mut self) {
        let mut added = Vec::new();
        let mut moved = Vec::new();
        let mut resized = Vec::new();
        let mut removed = Vec::new();
        let mut others = Vec::new();
        for event in std::mem::take(&mut self.pending) {
            match event {
                CanvasEvent::CellsAdded { cells } => added.extend(cells),
                CanvasEvent::CellsMoved { cells } => moved.extend(cells),
                CanvasEvent::CellsResized { cells } => resized.extend(cells),
                CanvasEvent::CellsRemoved { cells } => removed.extend(cells),
                other => others.push(other),
            }
        }
        if !added.is_empty() {
            self.events.push(CanvasEvent::CellsAdded { cells: added });
        }
        if !moved.is_empty() {
            self.events.push(CanvasEvent::CellsMoved { cells: moved });
        }
        if !resized.is_empty() {
            self.events.push(CanvasEvent::CellsResized { cells: resized });
        }
        if !removed.is_empty() {
            self.events.push(CanvasEvent::CellsRemoved { cells: removed });
        }
        self.events.extend(others);
    }
}

impl CanvasEngine for MemoryCanvas {
    fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    fn end_update(&mut self) {
        self.update_depth = self.update_depth.saturating_sub(1);
        if self.update_depth == 0 {
            self.flush_batch();
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.scale = 1.0;
        self.translate = (0.0, 0.0);
        self.next_edge_id = 0;
    }

    fn default_parent(&self) -> CellId {
        ROOT_LAYER.to_string()
    }

    fn insert_vertex(
        &mut self,
        parent: &str,
        id: &str,
        value: &str,
        geometry: Geometry,
        style: &str,
    ) -> Result<CellId> {
        self.check_parent(parent)?;
        if id == ROOT_LAYER || self.cells.contains_key(id) {
            return Err(CanvasError::DuplicateCell { id: id.to_string() });
        }
        self.cells.insert(
            id.to_string(),
            Cell {
                id: id.to_string(),
                kind: CellKind::Vertex,
                value: value.to_string(),
                parent: parent.to_string(),
                style: style.to_string(),
                geometry: Some(geometry),
                source: None,
                target: None,
            },
        );
        self.emit(CanvasEvent::CellsAdded {
            cells: vec![id.to_string()],
        });
        Ok(id.to_string())
    }

    fn insert_edge(
        &mut self,
        parent: &str,
        id: Option<&str>,
        value: &str,
        source: &str,
        target: &str,
        style: &str,
    ) -> Result<CellId> {
        let id = self.insert_edge_quiet(parent, id, value, source, target, style)?;
        self.emit(CanvasEvent::CellsAdded {
            cells: vec![id.clone()],
        });
        Ok(id)
    }

    fn cell(&self, id: &str) -> Option<Cell> {
        self.cells.get(id).cloned()
    }

    fn cells(&self) -> Vec<Cell> {
        self.cells.values().cloned().collect()
    }

    fn geometry(&self, id: &str) -> Option<Geometry> {
        self.cells.get(id)?.geometry
    }

    fn set_geometry(&mut self, id: &str, geometry: Geometry) -> Result<()> {
        self.cell_mut(id)?.geometry = Some(geometry);
        Ok(())
    }

    fn set_value(&mut self, id: &str, value: &str) -> Result<()> {
        self.cell_mut(id)?.value = value.to_string();
        Ok(())
    }

    fn rename_cell(&mut self, id: &str, new_id: &str) -> Result<()> {
        if !self.cells.contains_key(id) {
            return Err(CanvasError::UnknownCell { id: id.to_string() });
        }
        if id == new_id {
            return Ok(());
        }
        if new_id == ROOT_LAYER || self.cells.contains_key(new_id) {
            return Err(CanvasError::DuplicateCell {
                id: new_id.to_string(),
            });
        }
        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .map(|(key, mut cell)| {
                if cell.parent == id {
                    cell.parent = new_id.to_string();
                }
                for end in [&mut cell.source, &mut cell.target] {
                    if end.as_deref() == Some(id) {
                        *end = Some(new_id.to_string());
                    }
                }
                if key == id {
                    cell.id = new_id.to_string();
                    (new_id.to_string(), cell)
                } else {
                    (key, cell)
                }
            })
            .collect();
        Ok(())
    }

    fn parent_of(&self, id: &str) -> Option<CellId> {
        Some(self.cells.get(id)?.parent.clone())
    }

    fn update_group_bounds(&mut self, id: &str, padding: f64) -> Result<()> {
        let Some(group) = self.cell_mut(id)?.geometry else {
            return Ok(());
        };
        let child_ids: Vec<CellId> = self
            .cells
            .values()
            .filter(|c| c.parent == id && c.is_vertex() && c.geometry.is_some())
            .map(|c| c.id.clone())
            .collect();
        let geometries: Vec<Geometry> = child_ids
            .iter()
            .filter_map(|c| self.cells.get(c).and_then(|c| c.geometry))
            .collect();
        let Some(bounds) = Bounds::from_geometries(&geometries) else {
            return Ok(());
        };

        let dx = bounds.min_x - padding;
        let dy = bounds.min_y - padding;
        for child in &child_ids {
            if let Some(geo) = self.cells.get_mut(child).and_then(|c| c.geometry.as_mut()) {
                *geo = geo.translated(-dx, -dy);
            }
        }
        let resized = Geometry::new(
            group.x + dx,
            group.y + dy,
            bounds.width() + 2.0 * padding,
            bounds.height() + 2.0 * padding,
        );
        self.cell_mut(id)?.geometry = Some(resized);
        Ok(())
    }

    fn fit(&mut self, border: f64) {
        let top_level: Vec<Geometry> = self
            .cells
            .values()
            .filter(|c| c.parent == ROOT_LAYER && c.is_vertex())
            .filter_map(|c| c.geometry)
            .collect();
        let Some(bounds) = Bounds::from_geometries(&top_level) else {
            return;
        };
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        let sx = (self.viewport.0 - 2.0 * border) / bounds.width();
        let sy = (self.viewport.1 - 2.0 * border) / bounds.height();
        let scale = sx.min(sy);
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        self.scale = scale;
        self.translate = (border / scale - bounds.min_x, border / scale - bounds.min_y);
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn zoom_to(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }
}
