mod config;

use crate::*;

/// Model with one system `API` holding `N0 "Gateway"` and `N1 "DB"`.
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
    model
}
