mod pipeline;
mod scheduler;

use crate::canvas::MemoryCanvas;
use crate::*;

pub(crate) type TestEditor = Editor<MemoryCanvas, BufferSurface, ManualClock>;

pub(crate) fn editor() -> (TestEditor, ManualClock) {
    let clock = ManualClock::new();
    let editor = Editor::with_clock(
        MemoryCanvas::new(),
        BufferSurface::default(),
        EditorConfig::default(),
        clock.clone(),
    );
    (editor, clock)
}

pub(crate) fn add_system(editor: &mut TestEditor, name: &str) {
    editor
        .dispatch(Command::AddSystem {
            name: name.to_string(),
            style: SystemStyle::default(),
        })
        .unwrap();
}

/// Adds a node labelled `label` in `system` and returns its id.
pub(crate) fn add_node(editor: &mut TestEditor, label: &str, system: &str) -> String {
    let Outcome::NodeAdded(node) = editor.dispatch(Command::AddNode).unwrap() else {
        panic!("expected a node");
    };
    let form = NodeForm {
        label: label.to_string(),
        system: system.to_string(),
        ..NodeForm::from_node(&node)
    };
    editor
        .dispatch(Command::SaveNode {
            id: node.id.clone(),
            form,
        })
        .unwrap();
    node.id
}
