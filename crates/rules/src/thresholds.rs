//! Tunable rule thresholds.
//!
//! Every field has a built-in default, so an empty YAML document (or no file
//! at all) yields the stock configuration. A YAML file only needs to name the
//! values it overrides:
//!
//! ```yaml
//! cpa:
//!   target_cpa: 95.0
//! pacing:
//!   hourly_spend_limits:
//!     9: 0.10
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, RulesError};

// ── Top level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleThresholds {
    pub business_window: BusinessWindow,
    pub pacing: PacingThresholds,
    pub cpa: CpaThresholds,
    pub token: TokenThresholds,
    pub summary: SummarySchedule,
}

// ── Business window ─────────────────────────────────────────────────

/// The daily window in which pacing is judged, in a fixed reference timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusinessWindow {
    /// IANA timezone name.
    pub timezone: String,
    /// Short label shown in messages, e.g. "EST".
    pub timezone_label: String,
    /// First business hour (inclusive).
    pub day_start_hour: u32,
    /// Last business hour (inclusive).
    pub day_end_hour: u32,
    pub total_business_hours: u32,
}

impl Default for BusinessWindow {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            timezone_label: "EST".to_string(),
            day_start_hour: 8,
            day_end_hour: 23,
            total_business_hours: 15,
        }
    }
}

// ── Pacing ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacingThresholds {
    /// Spend percent below which the basic, hourly and velocity checks stay quiet.
    pub min_spend_percent: f64,
    /// Basic check: spend percent considered too high early in the day.
    pub spend_threshold_percent: f64,
    /// Basic check: day-progress percent up to which the day is "early".
    pub time_threshold_percent: f64,
    /// Velocity check: multiple of the expected hourly rate that fires.
    pub velocity_threshold: f64,
    /// Carried for YAML compatibility; no check reads it yet.
    pub acceleration_threshold: f64,
    /// Hour of day → maximum cumulative spend fraction by that hour.
    pub hourly_spend_limits: BTreeMap<u32, f64>,
    pub historical: HistoricalComparison,
    pub burst: BurstDetection,
    pub slow: SlowPacing,
}

impl Default for PacingThresholds {
    fn default() -> Self {
        let hourly_spend_limits = [
            (9, 0.15),
            (10, 0.25),
            (11, 0.35),
            (12, 0.45),
            (13, 0.55),
            (14, 0.65),
            (15, 0.75),
            (16, 0.85),
            (17, 0.95),
        ]
        .into_iter()
        .collect();

        Self {
            min_spend_percent: 35.0,
            spend_threshold_percent: 50.0,
            time_threshold_percent: 25.0,
            velocity_threshold: 2.0,
            acceleration_threshold: 1.5,
            hourly_spend_limits,
            historical: HistoricalComparison::default(),
            burst: BurstDetection::default(),
            slow: SlowPacing::default(),
        }
    }
}

impl PacingThresholds {
    /// Cumulative spend fraction allowed by `hour`.
    ///
    /// Uses the smallest configured hour at or after `hour`; past the last
    /// configured hour the whole budget (1.0) is allowed.
    pub fn hourly_limit_for(&self, hour: u32) -> f64 {
        self.hourly_spend_limits
            .range(hour..)
            .next()
            .map(|(_, limit)| *limit)
            .unwrap_or(1.0)
    }
}

/// Day-over-day deviation parameters. Carried in configuration only: the
/// watchdog keeps no history to compare against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoricalComparison {
    pub enabled: bool,
    pub lookback_days: u32,
    pub deviation_threshold: f64,
}

impl Default for HistoricalComparison {
    fn default() -> Self {
        Self {
            enabled: true,
            lookback_days: 7,
            deviation_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BurstDetection {
    pub enabled: bool,
    pub window_minutes: u32,
    pub threshold_percent: f64,
    /// Day progress below which the day counts as early.
    pub early_progress_percent: f64,
    /// Spend percent above which early spend is a burst.
    pub early_spend_percent: f64,
}

impl Default for BurstDetection {
    fn default() -> Self {
        Self {
            enabled: true,
            window_minutes: 30,
            threshold_percent: 0.1,
            early_progress_percent: 20.0,
            early_spend_percent: 40.0,
        }
    }
}

/// Slow pacing: spend fraction at or below `slow_threshold_percent` once the
/// day is at least `slow_time_threshold_percent` through. Both are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlowPacing {
    pub enabled: bool,
    pub slow_threshold_percent: f64,
    pub slow_time_threshold_percent: f64,
}

impl Default for SlowPacing {
    fn default() -> Self {
        Self {
            enabled: true,
            slow_threshold_percent: 0.2,
            slow_time_threshold_percent: 0.5,
        }
    }
}

// ── CPA / token ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpaThresholds {
    pub target_cpa: f64,
    /// CPA at or above `target_cpa * alert_multiplier` fires.
    pub alert_multiplier: f64,
    /// CPA is not judged until this much of the budget is spent.
    pub min_spend_percent: f64,
}

impl Default for CpaThresholds {
    fn default() -> Self {
        Self {
            target_cpa: 80.0,
            alert_multiplier: 1.5,
            min_spend_percent: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenThresholds {
    pub expiry_warning_days: u32,
}

impl Default for TokenThresholds {
    fn default() -> Self {
        Self {
            expiry_warning_days: 7,
        }
    }
}

// ── Summary reports ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportHour {
    pub hour: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummarySchedule {
    pub report_hours: Vec<ReportHour>,
}

impl Default for SummarySchedule {
    fn default() -> Self {
        Self {
            report_hours: vec![
                ReportHour {
                    hour: 12,
                    label: "Midday".to_string(),
                },
                ReportHour {
                    hour: 17,
                    label: "Evening".to_string(),
                },
            ],
        }
    }
}

// ── Loading & validation ────────────────────────────────────────────

impl RuleThresholds {
    /// Parse thresholds from a YAML document and validate them.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        let thresholds: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Read, parse and validate a YAML thresholds file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let thresholds = Self::from_yaml_str(&content)?;
        info!(path = %path.display(), "Loaded rule thresholds");
        Ok(thresholds)
    }

    /// Load from `path` when given, otherwise use the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Check internal consistency. Collects every problem instead of
    /// stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let w = &self.business_window;
        if w.timezone.parse::<Tz>().is_err() {
            errors.push(format!(
                "business_window.timezone: unknown timezone '{}'",
                w.timezone
            ));
        }
        if w.day_end_hour > 23 {
            errors.push("business_window.day_end_hour: must be 0-23".to_string());
        }
        if w.day_start_hour >= w.day_end_hour {
            errors.push(
                "business_window.day_start_hour: must be before day_end_hour".to_string(),
            );
        }
        if w.total_business_hours == 0 {
            errors.push("business_window.total_business_hours: must be positive".to_string());
        }

        for (hour, limit) in &self.pacing.hourly_spend_limits {
            if *hour > 23 {
                errors.push(format!("pacing.hourly_spend_limits.{hour}: hour must be 0-23"));
            }
            if !(*limit > 0.0 && *limit <= 1.0) {
                errors.push(format!(
                    "pacing.hourly_spend_limits.{hour}: limit must be in (0, 1], got {limit}"
                ));
            }
        }
        if self.pacing.velocity_threshold <= 0.0 {
            errors.push("pacing.velocity_threshold: must be positive".to_string());
        }

        if self.cpa.target_cpa <= 0.0 {
            errors.push("cpa.target_cpa: must be positive".to_string());
        }
        if self.cpa.alert_multiplier <= 0.0 {
            errors.push("cpa.alert_multiplier: must be positive".to_string());
        }

        let hours = &self.summary.report_hours;
        if hours.len() != 2 {
            errors.push(format!(
                "summary.report_hours: expected exactly 2 entries, got {}",
                hours.len()
            ));
        }
        for (i, slot) in hours.iter().enumerate() {
            if slot.hour > 23 {
                errors.push(format!("summary.report_hours[{i}].hour: must be 0-23"));
            }
            if slot.label.trim().is_empty() {
                errors.push(format!("summary.report_hours[{i}].label: must not be empty"));
            }
            if hours[..i].iter().any(|other| other.hour == slot.hour) {
                errors.push(format!(
                    "summary.report_hours[{i}].hour: duplicate hour {}",
                    slot.hour
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RulesError::Validation(errors))
        }
    }
}
