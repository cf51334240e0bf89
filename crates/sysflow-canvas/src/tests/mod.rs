mod build;
mod reconcile;
mod style;

use sysflow_core::{Connection, ConnectionType, Model, NodeForm, SystemStyle};

/// `API` holds `N0 "Gateway"` and `N1 "DB"`; `N1` has a dashed connection from `N0`.
pub(crate) fn api_model() -> Model {
    let mut model = Model::new();
    model.add_system("API", &SystemStyle::default()).unwrap();
    for label in ["Gateway", "DB"] {
        let id = model.add_node().unwrap().id.clone();
        let form = NodeForm {
            label: label.to_string(),
            system: "API".to_string(),
            ..NodeForm::default()
        };
        model.save_node(&id, &form).unwrap();
    }
    let idx = model.add_connection("N1").unwrap();
    let conn = Connection {
        source: "N0".to_string(),
        kind: ConnectionType::Dashed,
        ..Connection::default()
    };
    model.update_connection("N1", idx, conn).unwrap();
    model
}
