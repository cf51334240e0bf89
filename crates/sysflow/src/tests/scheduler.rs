use crate::*;
use serde_json::json;
use std::time::Duration;

const MS: Duration = Duration::from_millis(1);

#[test]
fn debouncer_fires_once_after_the_last_signal() {
    let clock = ManualClock::new();
    let mut d = Debouncer::new(150 * MS);
    d.signal(clock.now());
    clock.advance(100 * MS);
    assert!(!d.poll(clock.now()));

    // a new signal restarts the quiet period
    d.signal(clock.now());
    clock.advance(100 * MS);
    assert!(!d.poll(clock.now()));
    clock.advance(50 * MS);
    assert!(d.poll(clock.now()));
    assert!(!d.poll(clock.now()));
    assert!(!d.is_pending());
}

#[test]
fn cancel_drops_the_pending_deadline() {
    let clock = ManualClock::new();
    let mut d = Debouncer::new(10 * MS);
    d.signal(clock.now());
    d.cancel();
    clock.advance(20 * MS);
    assert!(!d.poll(clock.now()));
}

#[test]
fn channels_debounce_independently() {
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::new(clock.clone(), SchedulerConfig::default());
    let start = clock.now();
    scheduler.signal(Channel::Canvas);
    scheduler.signal(Channel::Form);
    assert_eq!(scheduler.next_deadline(), Some(start + 150 * MS));

    clock.advance(150 * MS);
    assert_eq!(
        scheduler.poll(),
        Fired {
            form: true,
            canvas: false
        }
    );
    assert!(scheduler.is_pending(Channel::Canvas));
    assert_eq!(scheduler.next_deadline(), Some(start + 300 * MS));

    clock.advance(150 * MS);
    assert_eq!(
        scheduler.poll(),
        Fired {
            form: false,
            canvas: true
        }
    );
    assert!(!scheduler.poll().any());
    assert_eq!(scheduler.next_deadline(), None);
}

#[test]
fn windows_come_from_config() {
    let cfg = EditorConfig::with_overrides(&json!({
        "scheduler": { "formDebounceMs": 20 }
    }));
    let config = SchedulerConfig::from_config(&cfg);
    assert_eq!(config.form_window, 20 * MS);
    assert_eq!(config.canvas_window, 300 * MS);

    let scheduler = Scheduler::new(SystemClock, config);
    assert_eq!(scheduler.debouncer(Channel::Form).window(), 20 * MS);
}
