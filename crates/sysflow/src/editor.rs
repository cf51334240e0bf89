//! The editor application state and its command dispatcher.

use indexmap::IndexMap;
use sysflow_canvas::{
    CanvasEngine, CanvasEvent, CanvasOptions, LabelChange, ReconcileReport, apply_label_change,
    build_canvas, reconcile,
};
use sysflow_core::{
    Connection, EditError, EditResult, EditorConfig, EmitOptions, Layout, MermaidSource, Model,
    Node, NodeForm, Renamed, SubgroupStyle, SystemStyle, emit_mermaid, export_json, import_json,
};

use crate::error::Result;
use crate::pipeline::{DiagramSurface, PassKind, PassReport, RenderGuard, render_text};
use crate::scheduler::{Channel, Clock, Scheduler, SchedulerConfig, SystemClock};

/// Collaborator calls into the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddSystem {
        name: String,
        style: SystemStyle,
    },
    RenameSystem {
        old: String,
        new: String,
    },
    DeleteSystem {
        name: String,
    },
    UpdateSystem {
        name: String,
        style: SystemStyle,
    },
    AddSubgroup {
        system: String,
        name: String,
        style: SubgroupStyle,
    },
    UpdateSubgroup {
        system: String,
        name: String,
        new_name: String,
        style: SubgroupStyle,
    },
    DeleteSubgroup {
        system: String,
        name: String,
    },
    AddNode,
    /// Saves a node form right away, replacing any staged form for the node.
    SaveNode {
        id: String,
        form: NodeForm,
    },
    DeleteNode {
        id: String,
    },
    AddConnection {
        target: String,
    },
    UpdateConnection {
        target: String,
        index: usize,
        connection: Connection,
    },
    RemoveConnection {
        target: String,
        index: usize,
    },
    /// A user-reordered system list.
    ReorderSystems {
        order: Vec<String>,
    },
    SetArrangement(Layout),
    SetLegend(String),
    SubgroupOptions {
        system: String,
    },
    SourceOptions {
        target: String,
    },
}

impl Command {
    fn mutates(&self) -> bool {
        !matches!(
            self,
            Self::SubgroupOptions { .. } | Self::SourceOptions { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Renamed(Renamed),
    NodeAdded(Node),
    ConnectionAdded { index: usize },
    SubgroupOptions(Vec<String>),
    /// `(id, display label)` pairs.
    SourceOptions(Vec<(String, String)>),
}

/// What one [`Editor::tick`] ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub reconciled: Option<ReconcileReport>,
    pub serialized: Option<PassReport>,
    pub regenerated: Option<PassReport>,
    /// A pass was due but another one was in flight.
    pub skipped: bool,
}

impl TickOutcome {
    pub fn is_idle(&self) -> bool {
        self.reconciled.is_none()
            && self.serialized.is_none()
            && self.regenerated.is_none()
            && !self.skipped
    }
}

/// Owns the model and keeps the diagram text and the canvas in step with it.
pub struct Editor<C: CanvasEngine, S: DiagramSurface, K: Clock = SystemClock> {
    model: Model,
    config: EditorConfig,
    emit_options: EmitOptions,
    canvas_options: CanvasOptions,
    scheduler: Scheduler<K>,
    guard: RenderGuard,
    staged: IndexMap<String, NodeForm>,
    importing: bool,
    last_source: Option<MermaidSource>,
    canvas: C,
    surface: S,
}

impl<C: CanvasEngine, S: DiagramSurface> Editor<C, S, SystemClock> {
    pub fn new(canvas: C, surface: S) -> Self {
        Self::with_clock(canvas, surface, EditorConfig::default(), SystemClock)
    }
}

impl<C: CanvasEngine, S: DiagramSurface, K: Clock> Editor<C, S, K> {
    pub fn with_clock(canvas: C, surface: S, config: EditorConfig, clock: K) -> Self {
        Self {
            model: Model::new(),
            emit_options: EmitOptions::from_config(&config),
            canvas_options: CanvasOptions::from_config(&config),
            scheduler: Scheduler::new(clock, SchedulerConfig::from_config(&config)),
            config,
            guard: RenderGuard::new(),
            staged: IndexMap::new(),
            importing: false,
            last_source: None,
            canvas,
            surface,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// Direct access for adapters that forward user gestures to the engine.
    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn scheduler(&self) -> &Scheduler<K> {
        &self.scheduler
    }

    pub fn render_guard(&self) -> &RenderGuard {
        &self.guard
    }

    pub fn last_source(&self) -> Option<&MermaidSource> {
        self.last_source.as_ref()
    }

    pub fn staged_form(&self, id: &str) -> Option<&NodeForm> {
        self.staged.get(id)
    }

    pub fn dispatch(&mut self, command: Command) -> EditResult<Outcome> {
        let mutates = command.mutates();
        let outcome = self.apply(command)?;
        if mutates {
            self.scheduler.signal(Channel::Form);
        }
        Ok(outcome)
    }

    fn apply(&mut self, command: Command) -> EditResult<Outcome> {
        let model = &mut self.model;
        let outcome = match command {
            Command::AddSystem { name, style } => {
                model.add_system(&name, &style)?;
                Outcome::Done
            }
            Command::RenameSystem { old, new } => {
                let renamed = model.rename_system(&old, &new)?;
                if renamed == Renamed::Renamed {
                    self.retarget_staged_system(old.trim(), new.trim());
                }
                Outcome::Renamed(renamed)
            }
            Command::DeleteSystem { name } => {
                model.delete_system(&name)?;
                Outcome::Done
            }
            Command::UpdateSystem { name, style } => {
                model.update_system(&name, &style)?;
                Outcome::Done
            }
            Command::AddSubgroup {
                system,
                name,
                style,
            } => {
                model.add_subgroup(&system, &name, &style)?;
                Outcome::Done
            }
            Command::UpdateSubgroup {
                system,
                name,
                new_name,
                style,
            } => {
                model.update_subgroup(&system, &name, &new_name, &style)?;
                self.retarget_staged_subgroup(&system, &name, new_name.trim());
                Outcome::Done
            }
            Command::DeleteSubgroup { system, name } => {
                model.delete_subgroup(&system, &name)?;
                Outcome::Done
            }
            Command::AddNode => Outcome::NodeAdded(model.add_node()?.clone()),
            Command::SaveNode { id, form } => {
                model.save_node(&id, &form)?;
                self.staged.shift_remove(&id);
                Outcome::Done
            }
            Command::DeleteNode { id } => {
                model.delete_node(&id)?;
                self.staged.shift_remove(&id);
                Outcome::Done
            }
            Command::AddConnection { target } => Outcome::ConnectionAdded {
                index: model.add_connection(&target)?,
            },
            Command::UpdateConnection {
                target,
                index,
                connection,
            } => {
                model.update_connection(&target, index, connection)?;
                Outcome::Done
            }
            Command::RemoveConnection { target, index } => {
                model.remove_connection(&target, index)?;
                Outcome::Done
            }
            Command::ReorderSystems { order } => {
                model.apply_list_order_to_placement(&order);
                Outcome::Done
            }
            Command::SetArrangement(layout) => {
                model.set_arrangement(layout);
                Outcome::Done
            }
            Command::SetLegend(html) => {
                model.set_legend(html);
                Outcome::Done
            }
            Command::SubgroupOptions { system } => {
                Outcome::SubgroupOptions(model.subgroup_options(&system))
            }
            Command::SourceOptions { target } => {
                Outcome::SourceOptions(model.source_options(&target))
            }
        };
        Ok(outcome)
    }

    /// Records pending form edits for a node; they are flushed by the next regenerate pass.
    pub fn stage_node_form(&mut self, id: &str, form: NodeForm) -> EditResult<()> {
        if self.model.node(id).is_none() {
            return Err(EditError::NodeNotFound { id: id.to_string() });
        }
        self.staged.insert(id.to_string(), form);
        self.scheduler.signal(Channel::Form);
        Ok(())
    }

    /// Handles a notification from the canvas. Label edits apply at once; everything else is
    /// reconciled by the next [`Editor::tick`] after the canvas quiet period.
    ///
    /// Notifications raised while a render pass is rebuilding the canvas are ignored.
    pub fn handle_canvas_event(
        &mut self,
        event: &CanvasEvent,
    ) -> EditResult<Option<LabelChange>> {
        if self.guard.is_busy() {
            return Ok(None);
        }
        self.scheduler.signal(Channel::Canvas);
        let CanvasEvent::LabelChanged { cell, value, .. } = event else {
            return Ok(None);
        };
        let change = apply_label_change(&mut self.canvas, &mut self.model, cell, value)?;
        match &change {
            LabelChange::NodeRelabeled { id } => {
                if let (Some(form), Some(node)) = (self.staged.get_mut(id), self.model.node(id)) {
                    form.label = node.label.clone();
                }
            }
            LabelChange::SystemRenamed { old, new } => self.retarget_staged_system(old, new),
            LabelChange::SubgroupRenamed { system, old, new } => {
                self.retarget_staged_subgroup(system, old, new)
            }
            LabelChange::Reverted | LabelChange::Ignored => {}
        }
        Ok(Some(change))
    }

    /// Points staged forms that name system `old` at `new`.
    fn retarget_staged_system(&mut self, old: &str, new: &str) {
        for form in self.staged.values_mut() {
            if form.system.trim() == old {
                form.system = new.to_string();
            }
        }
    }

    fn retarget_staged_subgroup(&mut self, system: &str, old: &str, new: &str) {
        if old == new {
            return;
        }
        for form in self.staged.values_mut() {
            if form.system.trim() == system && form.subgroup.trim() == old {
                form.subgroup = new.to_string();
            }
        }
    }

    /// Drains queued canvas notifications into [`Editor::handle_canvas_event`]. Returns the
    /// label changes applied; the first rejected label edit is returned as the error after all
    /// events were handled.
    pub fn pump_canvas_events(&mut self) -> EditResult<Vec<LabelChange>> {
        let mut changes = Vec::new();
        let mut first_err = None;
        for event in self.canvas.take_events() {
            match self.handle_canvas_event(&event) {
                Ok(Some(change)) => changes.push(change),
                Ok(None) => {}
                Err(err) => {
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(changes),
        }
    }

    /// Runs whatever the scheduler says is due.
    pub fn tick(&mut self) -> TickOutcome {
        let fired = self.scheduler.poll();
        let mut outcome = TickOutcome::default();
        if fired.canvas {
            if self.guard.is_busy() {
                outcome.skipped = true;
            } else {
                let report = reconcile(&self.canvas, &mut self.model);
                // canvas moves win over the membership a staged form still carries
                for moved in &report.reassigned {
                    if let Some(form) = self.staged.get_mut(&moved.node) {
                        form.system = moved.system.clone();
                        form.subgroup = moved.subgroup.clone();
                    }
                }
                tracing::debug!(
                    order_changed = report.order_changed,
                    reassigned = report.reassigned.len(),
                    connections = report.connections,
                    "canvas reconciled"
                );
                outcome.reconciled = Some(report);
                outcome.serialized = self.serialize_only();
                outcome.skipped |= outcome.serialized.is_none();
            }
        }
        if fired.form {
            outcome.regenerated = self.regenerate();
            outcome.skipped |= outcome.regenerated.is_none();
        }
        outcome
    }

    /// Full pass: flush staged forms, migrate placement, serialize, clear saved geometry,
    /// render the text and rebuild the canvas. `None` if a pass is already running.
    pub fn regenerate(&mut self) -> Option<PassReport> {
        let Some(_token) = self.guard.try_enter() else {
            tracing::warn!("regenerate dropped: a render pass is already running");
            return None;
        };

        let rejected = if self.importing {
            Vec::new()
        } else {
            self.flush_staged_forms()
        };
        self.model.migrate_legacy_placement_if_needed();
        let source = emit_mermaid(&self.model, &self.emit_options);
        self.model.clear_saved_geometry();

        let mut report = PassReport::new(PassKind::Regenerate, source);
        report.rejected_forms = rejected;
        render_text(&mut self.surface, &mut report);
        match build_canvas(&mut self.canvas, &self.model, &self.canvas_options) {
            Ok(built) => report.canvas = Some(built),
            Err(err) => {
                tracing::warn!(error = %err, "canvas rebuild failed");
                let message = format!("Canvas error: {err}");
                self.surface.show_error(&message);
                report.errors.push(message);
            }
        }
        // our own insertions, not user edits
        self.canvas.take_events();

        tracing::debug!(
            edges = report.source.edge_count,
            errors = report.errors.len(),
            "regenerate pass finished"
        );
        self.last_source = Some(report.source.clone());
        Some(report)
    }

    /// Serializes and renders the text view without touching the canvas.
    pub fn serialize_only(&mut self) -> Option<PassReport> {
        let Some(_token) = self.guard.try_enter() else {
            tracing::warn!("serialize pass dropped: a render pass is already running");
            return None;
        };
        self.model.migrate_legacy_placement_if_needed();
        let source = emit_mermaid(&self.model, &self.emit_options);
        let mut report = PassReport::new(PassKind::SerializeOnly, source);
        render_text(&mut self.surface, &mut report);
        tracing::debug!(edges = report.source.edge_count, "serialize-only pass finished");
        self.last_source = Some(report.source.clone());
        Some(report)
    }

    fn flush_staged_forms(&mut self) -> Vec<(String, EditError)> {
        let mut rejected = Vec::new();
        for (id, form) in std::mem::take(&mut self.staged) {
            if let Err(err) = self.model.save_node(&id, &form) {
                tracing::warn!(node = %id, error = %err, "staged node form rejected");
                rejected.push((id, err));
            }
        }
        rejected
    }

    /// Replaces the model with a snapshot, then regenerates. A snapshot that fails to parse or
    /// normalize leaves the current model untouched.
    pub fn import_json(&mut self, text: &str) -> Result<Option<PassReport>> {
        let model = import_json(text).inspect_err(|err| {
            tracing::warn!(error = %err, "snapshot rejected");
        })?;
        tracing::info!(
            systems = model.systems.len(),
            nodes = model.nodes.len(),
            "snapshot adopted"
        );
        self.model = model;
        self.staged.clear();
        self.scheduler.cancel(Channel::Form);
        self.scheduler.cancel(Channel::Canvas);

        self.importing = true;
        let report = self.regenerate();
        self.importing = false;
        Ok(report)
    }

    /// Flushes staged forms and exports the model as a pretty-printed snapshot.
    pub fn export_json(&mut self) -> Result<(String, Vec<(String, EditError)>)> {
        let rejected = self.flush_staged_forms();
        Ok((export_json(&self.model)?, rejected))
    }
}
