//! One monitoring pass: fetch, evaluate, enrich, gate, deliver.
//!
//! A [`Monitor`] holds no state between runs. Every call fetches a fresh
//! snapshot, so overlapping runs never share anything mutable.

use std::sync::Arc;

use adwatch_core::config::LegacyThresholds;
use adwatch_core::{percent_of, total_purchases, AccountSnapshot, Alert, MetricsSnapshot, Severity, SpendContext};
use adwatch_meta::{DateRange, MetricsSource, SourceError};
use adwatch_notify::AlertSink;
use adwatch_rules::checks::{self, CpaStatus};
use adwatch_rules::schedule::summary_due;
use adwatch_rules::{BusinessCalendar, BusinessDayState, Clock, RuleInput, RuleThresholds, RulesError, SystemClock};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::report::{PerformanceStatus, SegmentStatus, SpendStatus, StatusReport, TopSpender};

pub const MONITORING_ERROR_KEY: &str = "monitoring_error";

/// Label used when a summary is forced outside its scheduled hours.
const ON_DEMAND_SUMMARY_LABEL: &str = "Status";

/// Figures echoed back to the caller of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_spend: f64,
    pub spend_percent: f64,
    pub daily_budget: f64,
    pub segment_count: usize,
    pub day_progress_percent: u32,
    pub token_valid: bool,
    pub token_expires_at: i64,
}

impl RunSummary {
    fn new(snapshot: &MetricsSnapshot, day: &BusinessDayState) -> Self {
        let account = &snapshot.account;
        Self {
            total_spend: account.total_spend,
            spend_percent: account.spend_percent(),
            daily_budget: account.daily_budget,
            segment_count: snapshot.records.len(),
            day_progress_percent: day.progress_percent,
            token_valid: account.token.is_valid,
            token_expires_at: account.token.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        alerts: Vec<Alert>,
        summary: RunSummary,
        /// False when there was nothing to send or delivery was suppressed.
        delivered: bool,
    },
    /// The run aborted; `alerts` holds the single synthetic error alert.
    Failed { alerts: Vec<Alert>, error: String },
}

impl RunOutcome {
    pub fn alerts(&self) -> &[Alert] {
        match self {
            RunOutcome::Completed { alerts, .. } | RunOutcome::Failed { alerts, .. } => alerts,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RunOutcome::Failed { error, .. } => Some(error),
            RunOutcome::Completed { .. } => None,
        }
    }
}

/// Orchestrates monitoring runs against a metrics source and an alert sink.
pub struct Monitor {
    source: Arc<dyn MetricsSource>,
    sink: Arc<dyn AlertSink>,
    calendar: BusinessCalendar,
    thresholds: RuleThresholds,
    legacy: LegacyThresholds,
    clock: Arc<dyn Clock>,
}

impl Monitor {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        sink: Arc<dyn AlertSink>,
        thresholds: RuleThresholds,
        legacy: LegacyThresholds,
    ) -> Result<Self, RulesError> {
        Ok(Self {
            source,
            sink,
            calendar: BusinessCalendar::new(&thresholds.business_window)?,
            thresholds,
            legacy,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Fetching ────────────────────────────────────────────────────

    /// Fetch everything a run looks at. The six requests run concurrently;
    /// the first failure fails the whole snapshot.
    pub async fn snapshot(&self, today: NaiveDate) -> Result<MetricsSnapshot, SourceError> {
        let source = self.source.as_ref();
        let (token, records, daily_budget, total_spend, cpa, campaigns_active) = tokio::try_join!(
            source.token_status(),
            source.todays_records(today),
            source.daily_budget(today),
            source.account_spend(today),
            source.account_cpa(today),
            source.campaigns_active(),
        )?;

        info!(
            segments = records.len(),
            daily_budget,
            total_spend,
            cpa,
            campaigns_active,
            "Fetched account snapshot"
        );

        Ok(MetricsSnapshot {
            records,
            account: AccountSnapshot {
                total_spend,
                cpa,
                daily_budget,
                campaigns_active,
                token,
            },
        })
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Rule alerts for a snapshot, in delivery order, with any due summary
    /// appended and spend context attached. Pure given its arguments.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot, day: BusinessDayState, now: DateTime<Utc>) -> Vec<Alert> {
        let input = RuleInput::new(snapshot, day, &self.thresholds, now);
        let mut alerts = checks::evaluate_all(&input);

        if let Some(slot) = summary_due(&day, &self.thresholds.summary) {
            info!(report = %slot.label, hour = slot.hour, "Summary report due");
            alerts.extend(checks::daily_summary(&input, &slot.label));
        }

        let context = SpendContext {
            total_spend: snapshot.account.total_spend,
            spend_percent: input.spend_percent(),
            daily_budget: snapshot.account.daily_budget,
            current_hour: day.current_hour,
            day_progress_percent: day.progress_percent,
        };
        alerts
            .into_iter()
            .map(|alert| {
                if alert.is_spend_related() {
                    alert.with_spend_context(context.clone())
                } else {
                    alert
                }
            })
            .collect()
    }

    // ── Runs ────────────────────────────────────────────────────────

    /// Run every check once and deliver the result.
    ///
    /// Never returns an error: a failed fetch becomes a delivered
    /// `monitoring_error` alert and a [`RunOutcome::Failed`].
    pub async fn run_checks(&self) -> RunOutcome {
        let now = self.clock.now();
        let day = self.calendar.progress_at(now);
        info!(
            progress = day.progress_percent,
            hour = day.current_hour,
            tz = self.calendar.label(),
            in_window = day.is_business_hours,
            "Starting monitoring run"
        );

        let snapshot = match self.snapshot(self.calendar.local_date(now)).await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(e.to_string()).await,
        };

        let alerts = self.evaluate(&snapshot, day, now);
        let summary = RunSummary::new(&snapshot, &day);
        info!(
            alerts = alerts.len(),
            spend = summary.total_spend,
            spend_percent = summary.spend_percent,
            "Checks evaluated"
        );

        let delivered = self.deliver_gated(&alerts, snapshot.account.campaigns_active).await;
        RunOutcome::Completed {
            alerts,
            summary,
            delivered,
        }
    }

    /// Deliver unless there is nothing to say or nothing is running.
    async fn deliver_gated(&self, alerts: &[Alert], campaigns_active: bool) -> bool {
        if alerts.is_empty() {
            info!("No alerts, all checks passed");
            return false;
        }
        if !campaigns_active {
            info!(alerts = alerts.len(), "No active campaigns, suppressing delivery");
            return false;
        }
        self.deliver(alerts).await;
        true
    }

    async fn deliver(&self, alerts: &[Alert]) {
        let report = self.sink.deliver(alerts).await;
        if report.all_delivered() {
            info!(messages = report.messages, "Alerts delivered");
        } else {
            warn!(
                messages = report.messages,
                failures = report.failures(),
                "Some alert messages were not delivered"
            );
        }
    }

    async fn fail(&self, message: String) -> RunOutcome {
        error!(error = %message, "Monitoring run failed");
        let alert = Alert::new(
            MONITORING_ERROR_KEY,
            "🚨 Monitoring System Error",
            format!("Failed to run monitoring checks: {message}"),
            Severity::Critical,
        );
        let alerts = vec![alert];
        self.deliver(&alerts).await;
        RunOutcome::Failed {
            alerts,
            error: message,
        }
    }

    /// Build and deliver a summary report now, regardless of the hour.
    ///
    /// Without a label the scheduled slot label is used when one matches the
    /// current hour.
    pub async fn send_summary_now(&self, label: Option<&str>) -> Result<Vec<Alert>, SourceError> {
        let now = self.clock.now();
        let day = self.calendar.progress_at(now);
        let snapshot = self.snapshot(self.calendar.local_date(now)).await?;

        let label = label
            .map(str::to_string)
            .or_else(|| summary_due(&day, &self.thresholds.summary).map(|s| s.label.clone()))
            .unwrap_or_else(|| ON_DEMAND_SUMMARY_LABEL.to_string());

        let input = RuleInput::new(&snapshot, day, &self.thresholds, now);
        let alerts = checks::daily_summary(&input, &label);
        if alerts.is_empty() {
            info!("No segment data yet, summary skipped");
        } else {
            self.deliver(&alerts).await;
        }
        Ok(alerts)
    }

    /// Current spend, CPA and business-day position. Sends nothing.
    pub async fn status(&self) -> Result<StatusReport, SourceError> {
        let now = self.clock.now();
        let day = self.calendar.progress_at(now);
        let today = self.calendar.local_date(now);
        let source = self.source.as_ref();

        let (records, daily_budget, total_spend, cpa) = tokio::try_join!(
            source.todays_records(today),
            source.daily_budget(today),
            source.account_spend(today),
            source.account_cpa(today),
        )?;

        let mut spenders: Vec<_> = records.iter().collect();
        spenders.sort_by(|a, b| b.spend.total_cmp(&a.spend));
        let top_spenders = spenders.into_iter().take(3).map(TopSpender::from).collect();

        let target = self.thresholds.cpa.target_cpa;
        Ok(StatusReport {
            timestamp: now,
            timezone: self.thresholds.business_window.timezone.clone(),
            business_day: day,
            spend: SpendStatus {
                total: total_spend,
                daily_budget,
                percentage: percent_of(total_spend, daily_budget),
                remaining: daily_budget - total_spend,
            },
            performance: PerformanceStatus {
                purchases: total_purchases(&records),
                cpa,
                target_cpa: target,
                cpa_status: CpaStatus::classify(cpa, target),
            },
            segments: SegmentStatus {
                count: records.len(),
                top_spenders,
            },
        })
    }

    /// The first-generation checks: high spend per segment over the lookback
    /// window, and CTR drop against the window before it. Results are
    /// delivered without the active-campaign gate.
    pub async fn run_legacy_checks(&self) -> Result<Vec<Alert>, SourceError> {
        let today = self.calendar.local_date(self.clock.now());
        let (current, prior) = lookback_windows(today, self.legacy.lookback_days);
        info!(
            since = %current.since,
            until = %current.until,
            prior_since = %prior.since,
            "Running legacy checks"
        );

        let (current_rows, prior_rows) = tokio::try_join!(
            self.source.segment_insights(current),
            self.source.segment_insights(prior),
        )?;

        let mut alerts = checks::high_spend(&current_rows, self.legacy.spend_alert_threshold);
        alerts.extend(checks::ctr_drop(&current_rows, &prior_rows, self.legacy.ctr_drop_pct));

        if !alerts.is_empty() {
            self.deliver(&alerts).await;
        }
        Ok(alerts)
    }
}

/// The current window reaches back `days` before `today`; the prior window
/// has the same length and ends the day before the current one starts.
pub fn lookback_windows(today: NaiveDate, days: u32) -> (DateRange, DateRange) {
    let days = Duration::days(i64::from(days.max(1)));
    let current = DateRange {
        since: today - days,
        until: today,
    };
    let prior = DateRange {
        since: current.since - days,
        until: current.since - Duration::days(1),
    };
    (current, prior)
}
