//! Pure rule checks over a metrics snapshot.
//!
//! Each check takes a [`RuleInput`] and returns zero or more alerts. None of
//! them perform I/O or read the clock; "now" arrives through the input.

mod burst;
mod cpa;
mod legacy;
mod pacing;
mod summary;
mod token;


use adwatch_core::{Alert, MetricsSnapshot};
use chrono::{DateTime, Utc};

use crate::calendar::BusinessDayState;
use crate::thresholds::RuleThresholds;

pub use burst::spending_burst;
pub use cpa::{cpa_performance, percent_over_target, CpaStatus};
pub use legacy::{ctr_drop, high_spend};
pub use pacing::{pacing_irregularity, spending_velocity, PacingStatus, Velocity};
pub use summary::daily_summary;
pub use token::token_expiration;

/// Everything a check may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub snapshot: &'a MetricsSnapshot,
    pub day: BusinessDayState,
    pub thresholds: &'a RuleThresholds,
    pub now: DateTime<Utc>,
}

impl<'a> RuleInput<'a> {
    pub fn new(
        snapshot: &'a MetricsSnapshot,
        day: BusinessDayState,
        thresholds: &'a RuleThresholds,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot,
            day,
            thresholds,
            now,
        }
    }

    /// Account spend as a percent of the daily budget.
    pub fn spend_percent(&self) -> f64 {
        self.snapshot.account.spend_percent()
    }

    pub(crate) fn tz_label(&self) -> &str {
        &self.thresholds.business_window.timezone_label
    }
}

/// Run the reactive checks in their fixed order: token, pacing, burst, CPA.
///
/// Summary reports are scheduled separately; see [`daily_summary`].
pub fn evaluate_all(input: &RuleInput<'_>) -> Vec<Alert> {
    let mut alerts = token_expiration(input);
    alerts.extend(pacing_irregularity(input));
    alerts.extend(spending_burst(input));
    alerts.extend(cpa_performance(input));
    alerts
}
