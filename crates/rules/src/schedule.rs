//! When to run and when to report.
//!
//! Two independent cadences live here: the run cadence (how often the
//! watchdog polls, a cron expression selected by [`ScheduleMode`]) and the
//! summary slots (which business hours append a digest to the run).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};

use crate::calendar::BusinessDayState;
use crate::error::{Result, RulesError};
use crate::thresholds::{ReportHour, SummarySchedule};

// ── Summary slots ───────────────────────────────────────────────────

/// The report slot whose hour matches the current local hour, if any.
pub fn summary_due<'a>(day: &BusinessDayState, schedule: &'a SummarySchedule) -> Option<&'a ReportHour> {
    schedule
        .report_hours
        .iter()
        .find(|slot| slot.hour == day.current_hour)
}

// ── Run cadence ─────────────────────────────────────────────────────

/// Polling cadence. Test mode polls fast enough to watch alerts flow during
/// setup; production polls hourly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScheduleMode {
    Test,
    Production,
}

impl ScheduleMode {
    pub const TEST_CRON: &'static str = "*/30 * * * * *";
    pub const PRODUCTION_CRON: &'static str = "0 * * * *";

    pub fn cron_expression(&self) -> &'static str {
        match self {
            Self::Test => Self::TEST_CRON,
            Self::Production => Self::PRODUCTION_CRON,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Test => "Test mode: Every 30 seconds",
            Self::Production => "Production mode: Every hour",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "TEST",
            Self::Production => "PRODUCTION",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Test => Self::Production,
            Self::Production => Self::Test,
        }
    }

    /// Identify the mode from a cron expression; unknown expressions map to
    /// `None`.
    pub fn from_cron(expr: &str) -> Option<Self> {
        let normalized = normalize_cron(expr);
        [Self::Test, Self::Production]
            .into_iter()
            .find(|mode| normalize_cron(mode.cron_expression()) == normalized)
    }

    /// The next instant strictly after `after` at which this cadence fires.
    pub fn next_fire(&self, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        next_fire(self.cron_expression(), after)
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown schedule mode '{other}'")),
        }
    }
}

// ── Cron helpers ────────────────────────────────────────────────────

/// Normalize a 5-field cron expression to 6 fields by prepending a zero
/// seconds field. The `cron` crate wants `sec min hour dom month dow`.
pub fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Parse a 5- or 6-field cron expression.
pub fn parse_cron(expr: &str) -> Result<Schedule> {
    Schedule::from_str(&normalize_cron(expr)).map_err(|e| RulesError::Schedule {
        expr: expr.to_string(),
        message: e.to_string(),
    })
}

/// First tick of `expr` strictly after `after`.
pub fn next_fire(expr: &str, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    Ok(parse_cron(expr)?.after(&after).next())
}
