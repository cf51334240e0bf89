use crate::model::Model;
use crate::sanitize::escape_label;

const NOTES_SEPARATOR: &str = r#"<hr style="margin:4px 0;border:none;border-top:1px solid #ddd;">"#;

/// Legend HTML for exported images.
///
/// With `include_descriptions` set and at least one described node, a "Node Notes" block
/// listing each described node is appended after a rule.
pub fn export_legend(model: &Model, include_descriptions: bool) -> String {
    if !include_descriptions || !model.nodes.iter().any(|n| !n.desc.is_empty()) {
        return model.legend.clone();
    }
    let notes: String = model
        .nodes
        .iter()
        .filter(|n| !n.desc.is_empty())
        .map(|n| {
            format!(
                "<div><strong>{}:</strong> {}</div>",
                escape_label(n.display_label()),
                escape_label(&n.desc)
            )
        })
        .collect();
    format!(
        "{}{NOTES_SEPARATOR}<div style=\"font-size:11px;\"><strong>Node Notes</strong><br/>{notes}</div>",
        model.legend
    )
}
