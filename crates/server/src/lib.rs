//! Watchdog service: run orchestration, HTTP endpoints and the in-process
//! cron loop.

pub mod api;
pub mod cli;
pub mod report;
pub mod router;
pub mod runner;
pub mod scheduler;
pub mod state;

pub use report::StatusReport;
pub use router::build_router;
pub use runner::{Monitor, RunOutcome, RunSummary};
pub use state::{AppState, ScheduleState};
