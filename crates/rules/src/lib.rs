//! Budget-pacing and cost-efficiency rules for an ad account.
//!
//! This crate provides:
//! - `RuleThresholds` with built-in defaults and YAML overrides
//! - `BusinessCalendar` for business-day progress in a fixed timezone
//! - Pure rule checks (token, pacing, burst, CPA, summary, legacy)
//! - Summary-report slots and run-cadence cron helpers

pub mod calendar;
pub mod checks;
pub mod clock;
pub mod error;
pub mod schedule;
pub mod thresholds;

pub use calendar::{BusinessCalendar, BusinessDayState};
pub use checks::RuleInput;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, RulesError};
pub use schedule::ScheduleMode;
pub use thresholds::RuleThresholds;
