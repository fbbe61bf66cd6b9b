//! Budget pacing: is spend tracking the business day?

use adwatch_core::{Alert, Severity};
use serde::{Deserialize, Serialize};

use super::RuleInput;

/// Actual vs. expected hourly spend rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    /// Spend per elapsed business hour; 0 before the first hour has elapsed.
    pub velocity: f64,
    /// Daily budget spread evenly over the business window.
    pub expected: f64,
    pub ratio: f64,
}

pub fn spending_velocity(spend: f64, hours_elapsed: u32, daily_budget: f64, window_hours: u32) -> Velocity {
    let velocity = if hours_elapsed > 0 {
        spend / f64::from(hours_elapsed)
    } else {
        0.0
    };
    let expected = if window_hours > 0 {
        daily_budget / f64::from(window_hours)
    } else {
        0.0
    };
    let ratio = if expected > 0.0 { velocity / expected } else { 0.0 };
    Velocity {
        velocity,
        expected,
        ratio,
    }
}

/// Pacing standing shown in summary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStatus {
    BudgetNearlyExhausted,
    AheadOfSchedule,
    BehindSchedule,
    OnTrack,
}

impl PacingStatus {
    /// First match wins: >80% spent, then >50% spent before half-day, then
    /// <20% spent after half-day.
    pub fn classify(spend_percent: f64, progress_percent: u32) -> Self {
        if spend_percent > 80.0 {
            Self::BudgetNearlyExhausted
        } else if spend_percent > 50.0 && progress_percent < 50 {
            Self::AheadOfSchedule
        } else if spend_percent < 20.0 && progress_percent > 50 {
            Self::BehindSchedule
        } else {
            Self::OnTrack
        }
    }
}

/// Runs the four pacing checks: basic early-day overspend, hourly cumulative
/// limit, spend velocity, and slow spend.
///
/// Silent outside business hours and when no budget is known.
pub fn pacing_irregularity(input: &RuleInput<'_>) -> Vec<Alert> {
    let day = &input.day;
    let account = &input.snapshot.account;
    if !day.is_business_hours || account.daily_budget <= 0.0 {
        return Vec::new();
    }

    let p = &input.thresholds.pacing;
    let spend_percent = input.spend_percent();
    let progress = f64::from(day.progress_percent);
    let gated = spend_percent >= p.min_spend_percent;
    let mut alerts = Vec::new();

    if gated && spend_percent >= p.spend_threshold_percent && progress <= p.time_threshold_percent {
        alerts.push(Alert::new(
            "pacing_irregular_basic",
            "⚡ Spending Too Fast",
            format!(
                "{spend_percent:.0}% of budget spent by {}% of day. Expected max {}% by {}% of day.",
                day.progress_percent, p.spend_threshold_percent, p.time_threshold_percent
            ),
            Severity::Warning,
        ));
    }

    let limit_percent = p.hourly_limit_for(day.current_hour) * 100.0;
    if gated && spend_percent > limit_percent {
        alerts.push(Alert::new(
            "pacing_hourly_limit",
            "🚨 Hourly Limit Exceeded",
            format!(
                "{spend_percent:.0}% spent by {}:00 {} (limit: {limit_percent:.0}%)",
                day.current_hour,
                input.tz_label()
            ),
            Severity::Warning,
        ));
    }

    let v = spending_velocity(
        account.total_spend,
        day.hours_elapsed,
        account.daily_budget,
        input.thresholds.business_window.total_business_hours,
    );
    if gated && v.ratio > p.velocity_threshold {
        alerts.push(Alert::new(
            "pacing_velocity_high",
            "🚀 Spending Too Fast",
            format!(
                "Spending {:.1}x normal rate (${:.0}/hour)",
                v.ratio, v.velocity
            ),
            Severity::Warning,
        ));
    }

    let slow = &p.slow;
    if slow.enabled
        && spend_percent <= slow.slow_threshold_percent * 100.0
        && progress >= slow.slow_time_threshold_percent * 100.0
    {
        alerts.push(Alert::new(
            "pacing_slow",
            "🐌 Spending Too Slow",
            format!(
                "Only {spend_percent:.0}% spent by {}% of day",
                day.progress_percent
            ),
            Severity::Warning,
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_zero_before_first_hour() {
        let v = spending_velocity(100.0, 0, 200.0, 15);
        assert_eq!(v.velocity, 0.0);
        assert_eq!(v.ratio, 0.0);
    }

    #[test]
    fn velocity_ratio() {
        // $60/h against an expected $20/h.
        let v = spending_velocity(120.0, 2, 300.0, 15);
        assert_eq!(v.velocity, 60.0);
        assert_eq!(v.expected, 20.0);
        assert_eq!(v.ratio, 3.0);
    }

    #[test]
    fn pacing_status_priority() {
        assert_eq!(PacingStatus::classify(85.0, 10), PacingStatus::BudgetNearlyExhausted);
        assert_eq!(PacingStatus::classify(60.0, 40), PacingStatus::AheadOfSchedule);
        assert_eq!(PacingStatus::classify(60.0, 50), PacingStatus::OnTrack);
        assert_eq!(PacingStatus::classify(10.0, 60), PacingStatus::BehindSchedule);
        assert_eq!(PacingStatus::classify(10.0, 50), PacingStatus::OnTrack);
    }
}
