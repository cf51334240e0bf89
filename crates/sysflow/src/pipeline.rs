//! Render pass plumbing: the re-entrancy guard, the text-diagram surface and pass reports.

use std::cell::Cell;
use std::rc::Rc;

use sysflow_canvas::BuildReport;
use sysflow_core::{EditError, MermaidSource};

/// A failure reported by the external diagram renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where generated diagram text is shown.
pub trait DiagramSurface {
    fn render(&mut self, source: &str) -> Result<(), RenderError>;

    /// Shows `message` in place of the diagram.
    fn show_error(&mut self, message: &str);
}

/// Keeps the last rendered source and the last error shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferSurface {
    pub source: Option<String>,
    pub error: Option<String>,
    pub renders: usize,
}

impl DiagramSurface for BufferSurface {
    fn render(&mut self, source: &str) -> Result<(), RenderError> {
        self.source = Some(source.to_string());
        self.error = None;
        self.renders += 1;
        Ok(())
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}

/// Boolean re-entrancy guard for render passes. Clones share the flag, so an adapter can hold
/// one to check whether a pass is in flight.
#[derive(Debug, Clone, Default)]
pub struct RenderGuard {
    busy: Rc<Cell<bool>>,
}

impl RenderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Marks a pass as running; `None` if one already is. The flag clears when the token drops.
    pub fn try_enter(&self) -> Option<RenderToken> {
        if self.busy.replace(true) {
            return None;
        }
        Some(RenderToken {
            busy: Rc::clone(&self.busy),
        })
    }
}

#[derive(Debug)]
pub struct RenderToken {
    busy: Rc<Cell<bool>>,
}

impl Drop for RenderToken {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Flush forms, serialize, render text and rebuild the canvas.
    Regenerate,
    /// Serialize and render text; the canvas is left alone.
    SerializeOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub kind: PassKind,
    pub source: MermaidSource,
    /// Set when the canvas was rebuilt successfully.
    pub canvas: Option<BuildReport>,
    /// Staged node forms that failed validation and were discarded.
    pub rejected_forms: Vec<(String, EditError)>,
    /// Messages shown on the diagram surface instead of a diagram.
    pub errors: Vec<String>,
}

impl PassReport {
    pub(crate) fn new(kind: PassKind, source: MermaidSource) -> Self {
        Self {
            kind,
            source,
            canvas: None,
            rejected_forms: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.rejected_forms.is_empty() && self.errors.is_empty()
    }
}

/// Renders the pass's source, or inline error text when the renderer fails.
pub(crate) fn render_text<S: DiagramSurface + ?Sized>(surface: &mut S, report: &mut PassReport) {
    if let Err(err) = surface.render(&report.source.text) {
        tracing::warn!(error = %err, "diagram render failed");
        let message = format!("Render error: {err}");
        surface.show_error(&message);
        report.errors.push(message);
    }
}
