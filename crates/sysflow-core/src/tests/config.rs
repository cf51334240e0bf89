use crate::*;
use serde_json::json;

#[test]
fn defaults_are_addressable_by_dotted_path() {
    let cfg = EditorConfig::default();
    assert_eq!(cfg.get_bool("edgeStyle.safeMode"), Some(false));
    assert_eq!(cfg.get_bool("edgeStyle.skipIfCorrupt"), None);
    assert_eq!(cfg.get_u64("scheduler.formDebounceMs"), Some(150));
    assert_eq!(cfg.get_u64("scheduler.canvasDebounceMs"), Some(300));
    assert_eq!(cfg.get_f64("canvas.maxScale"), Some(1.5));
    assert_eq!(cfg.get_f64("canvas.groupPadding"), Some(20.0));
    assert_eq!(cfg.get_bool("canvas.maxScale"), None);
    assert_eq!(cfg.get_bool("missing.path"), None);
}

#[test]
fn overrides_deep_merge_over_defaults() {
    let cfg = EditorConfig::with_overrides(&json!({
        "edgeStyle": { "safeMode": true },
        "canvas": { "fitBorder": 10 },
        "theme": "dark"
    }));
    assert_eq!(cfg.get_bool("edgeStyle.safeMode"), Some(true));
    assert_eq!(cfg.get_u64("canvas.fitBorder"), Some(10));
    assert_eq!(cfg.get_f64("canvas.minScale"), Some(0.3));
    assert_eq!(cfg.as_value()["theme"], json!("dark"));
}

#[test]
fn set_value_creates_intermediate_objects() {
    let mut cfg = EditorConfig::from_value(json!("not an object"));
    cfg.set_value("scheduler.formDebounceMs", json!(50));
    assert_eq!(cfg.as_value(), &json!({ "scheduler": { "formDebounceMs": 50 } }));

    let mut cfg = EditorConfig::from_value(json!({}));
    cfg.set_value("a", json!(1));
    cfg.set_value("a.b", json!(true));
    assert_eq!(cfg.as_value(), &json!({ "a": { "b": true } }));
}
