use crate::*;

#[test]
fn guard_allows_one_pass_at_a_time() {
    let guard = RenderGuard::new();
    let shared = guard.clone();
    let token = guard.try_enter().unwrap();
    assert!(shared.is_busy());
    assert!(shared.try_enter().is_none());
    drop(token);
    assert!(!guard.is_busy());
    assert!(shared.try_enter().is_some());
}

#[test]
fn buffer_surface_keeps_the_last_render() {
    let mut surface = BufferSurface::default();
    surface.show_error("boom");
    surface.render("graph TD").unwrap();
    assert_eq!(surface.source.as_deref(), Some("graph TD"));
    assert_eq!(surface.error, None);
    assert_eq!(surface.renders, 1);
}
