/// Validation failures of model edit operations.
///
/// The `Display` text is the user-facing message; callers that applied an optimistic UI change
/// (e.g. a canvas label edit) must revert it when they receive one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Empty name")]
    EmptyName,

    #[error("Names required")]
    NamesRequired,

    #[error("System already exists: {name}")]
    SystemExists { name: String },

    #[error("System not found: {name}")]
    SystemNotFound { name: String },

    #[error("Subgroup already exists in {system}: {name}")]
    SubgroupExists { system: String, name: String },

    #[error("Subgroup not found in {system}: {name}")]
    SubgroupNotFound { system: String, name: String },

    #[error("Subgroup {subgroup} requires a system")]
    SystemRequired { subgroup: String },

    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    #[error("Connection {index} not found on node {target}")]
    ConnectionNotFound { target: String, index: usize },

    #[error("No node ids left")]
    NodeIdsExhausted,
}

/// Snapshot import failures. An import that fails never touches the live model.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot root must be a JSON object")]
    NotAnObject,

    #[error("Invalid `{field}`: expected {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("Node #{index} is missing an id")]
    MissingNodeId { index: usize },

    #[error("Duplicate node id: {id}")]
    DuplicateNodeId { id: String },
}
