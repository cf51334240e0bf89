//! Trailing-edge debouncing of mutation signals.
//!
//! Nothing here spawns timers: the host polls [`Scheduler::poll`] (e.g. from its event loop
//! or a periodic tick) and runs whatever fired. Each channel has at most one pending deadline;
//! a new signal replaces it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use sysflow_core::EditorConfig;

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Restarts the quiet period at `now`.
    pub fn signal(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Fires (and disarms) once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Edits coming from the form UI; fires a full regenerate.
    Form,
    /// Edits made on the canvas; fires reconciliation plus a serialize-only pass.
    Canvas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub form_window: Duration,
    pub canvas_window: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            form_window: Duration::from_millis(150),
            canvas_window: Duration::from_millis(300),
        }
    }
}

impl SchedulerConfig {
    pub fn from_config(config: &EditorConfig) -> Self {
        let defaults = Self::default();
        Self {
            form_window: config
                .get_u64("scheduler.formDebounceMs")
                .map_or(defaults.form_window, Duration::from_millis),
            canvas_window: config
                .get_u64("scheduler.canvasDebounceMs")
                .map_or(defaults.canvas_window, Duration::from_millis),
        }
    }
}

/// Channels that fired in one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fired {
    pub form: bool,
    pub canvas: bool,
}

impl Fired {
    pub fn any(&self) -> bool {
        self.form || self.canvas
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<K: Clock = SystemClock> {
    clock: K,
    form: Debouncer,
    canvas: Debouncer,
}

impl<K: Clock> Scheduler<K> {
    pub fn new(clock: K, config: SchedulerConfig) -> Self {
        Self {
            clock,
            form: Debouncer::new(config.form_window),
            canvas: Debouncer::new(config.canvas_window),
        }
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn signal(&mut self, channel: Channel) {
        let now = self.clock.now();
        self.debouncer_mut(channel).signal(now);
    }

    pub fn poll(&mut self) -> Fired {
        let now = self.clock.now();
        Fired {
            form: self.form.poll(now),
            canvas: self.canvas.poll(now),
        }
    }

    pub fn is_pending(&self, channel: Channel) -> bool {
        self.debouncer(channel).is_pending()
    }

    /// The earliest pending deadline, for hosts that sleep until the next fire.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.form.deadline(), self.canvas.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn cancel(&mut self, channel: Channel) {
        self.debouncer_mut(channel).cancel();
    }

    pub fn debouncer(&self, channel: Channel) -> &Debouncer {
        match channel {
            Channel::Form => &self.form,
            Channel::Canvas => &self.canvas,
        }
    }

    fn debouncer_mut(&mut self, channel: Channel) -> &mut Debouncer {
        match channel {
            Channel::Form => &mut self.form,
            Channel::Canvas => &mut self.canvas,
        }
    }
}
