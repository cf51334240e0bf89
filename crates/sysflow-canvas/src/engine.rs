//! The seam between the editor and an interactive graph-editing surface.

use crate::cell::{Cell, CellId, Geometry};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanvasError {
    #[error("Unknown cell: {id}")]
    UnknownCell { id: CellId },

    #[error("Unknown parent cell: {id}")]
    UnknownParent { id: CellId },

    #[error("Edge endpoint not found: {id}")]
    MissingEndpoint { id: CellId },

    #[error("Duplicate cell id: {id}")]
    DuplicateCell { id: CellId },

    #[error("Canvas engine error: {message}")]
    Engine { message: String },
}

pub type Result<T> = std::result::Result<T, CanvasError>;

/// Structural change notifications raised by the surface after user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasEvent {
    CellsMoved { cells: Vec<CellId> },
    CellsResized { cells: Vec<CellId> },
    CellConnected { edge: CellId },
    CellsRemoved { cells: Vec<CellId> },
    CellsAdded { cells: Vec<CellId> },
    LabelChanged {
        cell: CellId,
        value: String,
        old: String,
    },
}

impl CanvasEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CellsMoved { .. } => "cellsMoved",
            Self::CellsResized { .. } => "cellsResized",
            Self::CellConnected { .. } => "cellConnected",
            Self::CellsRemoved { .. } => "cellsRemoved",
            Self::CellsAdded { .. } => "cellsAdded",
            Self::LabelChanged { .. } => "labelChanged",
        }
    }
}

/// Operations the editor needs from a graph-editing engine.
///
/// Geometries are relative to the parent cell. Mutations between `begin_update` and the
/// matching `end_update` form one batch; engines notify listeners once per batch.
pub trait CanvasEngine {
    fn begin_update(&mut self);
    fn end_update(&mut self);

    /// Removes every cell below the default parent.
    fn clear(&mut self);

    /// The layer that top-level cells are inserted into.
    fn default_parent(&self) -> CellId;

    fn insert_vertex(
        &mut self,
        parent: &str,
        id: &str,
        value: &str,
        geometry: Geometry,
        style: &str,
    ) -> Result<CellId>;

    /// Inserts an edge; `id` of `None` lets the engine pick one.
    fn insert_edge(
        &mut self,
        parent: &str,
        id: Option<&str>,
        value: &str,
        source: &str,
        target: &str,
        style: &str,
    ) -> Result<CellId>;

    fn cell(&self, id: &str) -> Option<Cell>;

    /// All cells in insertion order.
    fn cells(&self) -> Vec<Cell>;

    fn geometry(&self, id: &str) -> Option<Geometry> {
        self.cell(id)?.geometry
    }

    fn set_geometry(&mut self, id: &str, geometry: Geometry) -> Result<()>;
    fn set_value(&mut self, id: &str, value: &str) -> Result<()>;
    fn rename_cell(&mut self, id: &str, new_id: &str) -> Result<()>;

    fn parent_of(&self, id: &str) -> Option<CellId> {
        Some(self.cell(id)?.parent)
    }

    /// Moves and resizes a container to enclose its children plus `padding`.
    fn update_group_bounds(&mut self, id: &str, padding: f64) -> Result<()>;

    /// Scales and translates the view so the whole graph fits with `border`.
    fn fit(&mut self, border: f64);
    fn scale(&self) -> f64;
    fn zoom_to(&mut self, scale: f64);

    /// Notifications queued since the last call. Engines that invoke listeners synchronously
    /// keep the default.
    fn take_events(&mut self) -> Vec<CanvasEvent> {
        Vec::new()
    }
}
