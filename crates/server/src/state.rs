use std::sync::Arc;

use adwatch_core::Config;
use adwatch_rules::ScheduleMode;
use tokio::sync::watch;

use crate::runner::Monitor;

/// The polling cadence currently in force.
///
/// Per-instance and in memory only: it starts from configuration and resets
/// on restart. Subscribers are woken on every change.
#[derive(Debug)]
pub struct ScheduleState {
    tx: watch::Sender<ScheduleMode>,
}

impl ScheduleState {
    pub fn new(initial: ScheduleMode) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> ScheduleMode {
        *self.tx.borrow()
    }

    pub fn set(&self, mode: ScheduleMode) {
        self.tx.send_if_modified(|current| {
            let changed = *current != mode;
            *current = mode;
            changed
        });
    }

    /// Flip between test and production; returns the new mode.
    pub fn toggle(&self) -> ScheduleMode {
        let mut next = self.current();
        self.tx.send_modify(|current| {
            *current = current.toggled();
            next = *current;
        });
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<ScheduleMode> {
        self.tx.subscribe()
    }
}

pub struct AppState {
    pub config: Config,
    pub monitor: Arc<Monitor>,
    pub schedule: ScheduleState,
    /// Client for the toggle endpoint's self-call.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, monitor: Arc<Monitor>, mode: ScheduleMode) -> Self {
        Self {
            config,
            monitor,
            schedule: ScheduleState::new(mode),
            http: reqwest::Client::new(),
        }
    }

    /// Whether `secret` matches the configured shared secret.
    pub fn authorized(&self, secret: Option<&str>) -> bool {
        secret.is_some_and(|s| !s.is_empty() && constant_time_eq(s, &self.config.cron_secret))
    }
}

/// Compares every byte of equal-length inputs regardless of where they differ.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
