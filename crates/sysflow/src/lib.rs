#![forbid(unsafe_code)]

//! `sysflow` is a headless editor for system diagrams: named systems and subgroups holding
//! nodes joined by styled connections.
//!
//! The [`Editor`] owns the model and keeps two views in step with it: Mermaid `graph` source
//! text rendered through a [`DiagramSurface`], and an interactive canvas behind
//! [`canvas::CanvasEngine`]. Form edits and canvas edits are debounced separately and polled
//! with [`Editor::tick`].
//!
//! The model, emitter and snapshot format are re-exported from `sysflow-core`; the canvas
//! bridge lives under [`canvas`].

mod editor;
mod error;
pub mod pipeline;
pub mod scheduler;

pub use sysflow_core::*;

pub mod canvas {
    pub use sysflow_canvas::*;
}

pub use editor::{Command, Editor, Outcome, TickOutcome};
pub use error::{Error, Result};
pub use pipeline::{
    BufferSurface, DiagramSurface, PassKind, PassReport, RenderError, RenderGuard, RenderToken,
};
pub use scheduler::{
    Channel, Clock, Debouncer, Fired, ManualClock, Scheduler, SchedulerConfig, SystemClock,
};

#[cfg(test)]
mod tests;
