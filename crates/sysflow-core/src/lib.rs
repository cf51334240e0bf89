#![forbid(unsafe_code)]

//! Diagram model, Mermaid emitter and snapshot format for a system/node diagram editor
//! (headless).
//!
//! A [`Model`] holds named systems (optionally split into subgroups), nodes carrying their
//! incoming connections, and the ordering/placement bookkeeping for systems. It is only
//! mutated through its edit operations, which validate input and keep cross references in
//! step. [`emit_mermaid`] turns a model into deterministic `graph` source text.

pub mod config;
mod edit;
pub mod emit;
pub mod error;
pub mod legend;
pub mod model;
mod placement;
pub mod sanitize;
pub mod snapshot;

pub use config::EditorConfig;
pub use edit::{EditResult, NodeForm, Renamed};
pub use emit::{
    EmitOptions, LinkStyleStatus, MermaidSource, emit_mermaid, guard_link_styles, to_mermaid,
};
pub use error::{EditError, ImportError};
pub use legend::export_legend;
pub use model::{
    Connection, ConnectionType, EdgeStyleDef, IdCollision, Layout, LinePattern, Model, Node,
    Placement, Shape, Subgroup, SubgroupStyle, System, SystemStyle,
};
pub use snapshot::{Snapshot, export_json, import_json, import_value};

#[cfg(test)]
mod tests;
