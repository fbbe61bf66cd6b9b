//! Business-day progress in the reference timezone.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RulesError};
use crate::thresholds::BusinessWindow;

/// Where "now" sits inside the business window.
///
/// Outside the window progress and elapsed are 0 and the whole window
/// remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDayState {
    /// Hour of day in the reference timezone, 0-23.
    pub current_hour: u32,
    /// 0-100.
    pub progress_percent: u32,
    pub hours_elapsed: u32,
    pub hours_remaining: u32,
    pub is_business_hours: bool,
}

impl BusinessDayState {
    /// Progress for a given local hour within `window`.
    pub fn for_hour(window: &BusinessWindow, hour: u32) -> Self {
        let total = window.total_business_hours;
        if hour < window.day_start_hour || hour > window.day_end_hour {
            return Self {
                current_hour: hour,
                progress_percent: 0,
                hours_elapsed: 0,
                hours_remaining: total,
                is_business_hours: false,
            };
        }

        let elapsed = hour - window.day_start_hour;
        let progress = if total == 0 {
            0
        } else {
            ((elapsed as f64 / total as f64) * 100.0).round() as u32
        };

        Self {
            current_hour: hour,
            progress_percent: progress.min(100),
            hours_elapsed: elapsed,
            hours_remaining: total.saturating_sub(elapsed),
            is_business_hours: true,
        }
    }
}

/// Maps instants onto the business window of a fixed timezone.
#[derive(Debug, Clone)]
pub struct BusinessCalendar {
    window: BusinessWindow,
    tz: Tz,
}

impl BusinessCalendar {
    pub fn new(window: &BusinessWindow) -> Result<Self> {
        let tz = window
            .timezone
            .parse::<Tz>()
            .map_err(|_| RulesError::Timezone(window.timezone.clone()))?;
        Ok(Self {
            window: window.clone(),
            tz,
        })
    }

    pub fn window(&self) -> &BusinessWindow {
        &self.window
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Short display label such as "EST".
    pub fn label(&self) -> &str {
        &self.window.timezone_label
    }

    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.tz)
    }

    /// The reference-timezone calendar date containing `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_time(now).date_naive()
    }

    pub fn progress_at(&self, now: DateTime<Utc>) -> BusinessDayState {
        BusinessDayState::for_hour(&self.window, self.local_time(now).hour())
    }

    /// Business-day progress for the current wall-clock time.
    pub fn progress(&self) -> BusinessDayState {
        self.progress_at(Utc::now())
    }

    /// Human-readable local timestamp, e.g. `10/18/2026, 2:05:07 PM`.
    pub fn format_timestamp(&self, now: DateTime<Utc>) -> String {
        self.local_time(now)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string()
    }
}
