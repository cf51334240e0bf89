#![forbid(unsafe_code)]

//! Bridge between a sysflow [`Model`](sysflow_core::Model) and an interactive graph-editing
//! canvas.
//!
//! The canvas itself sits behind [`CanvasEngine`]. [`build_canvas`] rebuilds every cell from a
//! model; [`reconcile`] and [`apply_label_change`] pull user edits made on the canvas back into
//! the model. [`MemoryCanvas`] is a headless engine for tests and command-line use.

pub mod build;
pub mod cell;
pub mod engine;
pub mod memory;
pub mod reconcile;
pub mod style;

pub use build::{BuildReport, CanvasOptions, build_canvas};
pub use cell::{Bounds, Cell, CellId, CellKind, Geometry};
pub use engine::{CanvasEngine, CanvasError, CanvasEvent, Result};
pub use memory::{MemoryCanvas, ROOT_LAYER};
pub use reconcile::{LabelChange, Reassignment, ReconcileReport, apply_label_change, reconcile};

#[cfg(test)]
mod tests;
