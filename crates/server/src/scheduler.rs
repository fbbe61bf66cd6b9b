//! In-process cron loop.
//!
//! Sleeps until the next tick of the current [`ScheduleMode`] and spawns a
//! monitoring run on each tick. A schedule change wakes the loop early so
//! the new cadence applies immediately. Runs are never awaited by the loop,
//! so a slow run can overlap the next one.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::runner::RunOutcome;
use crate::state::AppState;

/// Drive scheduled runs until the schedule state goes away.
pub async fn run_schedule_loop(state: Arc<AppState>) {
    let mut changes = state.schedule.subscribe();
    info!(mode = %state.schedule.current(), "Scheduler started");

    loop {
        let mode = *changes.borrow_and_update();
        let now = Utc::now();
        let next = match mode.next_fire(now) {
            Ok(Some(next)) => next,
            Ok(None) => {
                warn!(mode = %mode, "Schedule has no upcoming ticks, scheduler stopping");
                return;
            }
            Err(e) => {
                error!(mode = %mode, error = %e, "Invalid schedule, scheduler stopping");
                return;
            }
        };
        let wait = (next - now).to_std().unwrap_or_default();
        debug!(mode = %mode, next = %next, wait_secs = wait.as_secs(), "Waiting for next tick");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                spawn_run(state.clone());
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    return;
                }
                let mode = *changes.borrow();
                info!(mode = %mode, "Schedule changed, rescheduling");
            }
        }
    }
}

fn spawn_run(state: Arc<AppState>) {
    tokio::spawn(async move {
        match state.monitor.run_checks().await {
            RunOutcome::Completed { alerts, delivered, .. } => {
                info!(alerts = alerts.len(), delivered, "Scheduled run completed");
            }
            RunOutcome::Failed { error, .. } => {
                warn!(error = %error, "Scheduled run failed");
            }
        }
    });
}
