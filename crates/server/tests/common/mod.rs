#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use adwatch_core::config::LegacyThresholds;
use adwatch_core::{Alert, Config, ConversionAction, MetricsRecord, TokenStatus};
use adwatch_meta::{DateRange, MetricsSource, SourceError};
use adwatch_notify::{AlertSink, DeliveryReport};
use adwatch_rules::{FixedClock, RuleThresholds, ScheduleMode};
use adwatch_server::{AppState, Monitor};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

pub const SECRET: &str = "s3cret";

/// 2026-10-14 is in daylight time, so New York is UTC-4.
pub fn at_local_hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, hour + 4, 5, 0).unwrap()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

pub fn record(id: &str, name: &str, spend: f64, ctr: f64, purchases: f64) -> MetricsRecord {
    MetricsRecord {
        segment_id: id.to_string(),
        segment_name: name.to_string(),
        spend,
        impressions: 1000,
        clicks: 20,
        ctr,
        cpc: 1.5,
        actions: vec![ConversionAction {
            action_type: "purchase".to_string(),
            value: purchases,
        }],
    }
}

// ── Source ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockSource {
    pub records: Vec<MetricsRecord>,
    /// Returned for any range that does not end today.
    pub prior_records: Vec<MetricsRecord>,
    pub token: TokenStatus,
    pub daily_budget: f64,
    pub account_spend: f64,
    pub account_cpa: f64,
    pub campaigns_active: bool,
    pub fail_with: Option<String>,
    pub ranges: Arc<Mutex<Vec<DateRange>>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self {
            records: vec![record("1", "Prospecting", 100.0, 2.0, 1.0)],
            prior_records: Vec::new(),
            token: TokenStatus::never_expires(),
            daily_budget: 1000.0,
            account_spend: 100.0,
            account_cpa: 0.0,
            campaigns_active: true,
            fail_with: None,
            ranges: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockSource {
    /// Every fetch fails once `fail_with` is set.
    fn reachable(&self) -> Result<(), SourceError> {
        match &self.fail_with {
            Some(message) => Err(SourceError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetricsSource for MockSource {
    async fn token_status(&self) -> Result<TokenStatus, SourceError> {
        self.reachable()?;
        Ok(self.token.clone())
    }

    async fn segment_insights(&self, range: DateRange) -> Result<Vec<MetricsRecord>, SourceError> {
        self.reachable()?;
        self.ranges.lock().unwrap().push(range);
        if range.until == today() {
            Ok(self.records.clone())
        } else {
            Ok(self.prior_records.clone())
        }
    }

    async fn daily_budget(&self, _today: NaiveDate) -> Result<f64, SourceError> {
        self.reachable()?;
        Ok(self.daily_budget)
    }

    async fn account_spend(&self, _today: NaiveDate) -> Result<f64, SourceError> {
        self.reachable()?;
        Ok(self.account_spend)
    }

    async fn account_cpa(&self, _today: NaiveDate) -> Result<f64, SourceError> {
        self.reachable()?;
        Ok(self.account_cpa)
    }

    async fn campaigns_active(&self) -> Result<bool, SourceError> {
        self.reachable()?;
        Ok(self.campaigns_active)
    }
}

// ── Sink ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub calls: Mutex<Vec<Vec<Alert>>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<Vec<Alert>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn deliver(&self, alerts: &[Alert]) -> DeliveryReport {
        self.calls.lock().unwrap().push(alerts.to_vec());
        DeliveryReport {
            messages: alerts.len(),
            results: Vec::new(),
        }
    }
}

// ── Wiring ──────────────────────────────────────────────────────────

pub fn monitor(source: MockSource, sink: Arc<RecordingSink>, now: DateTime<Utc>) -> Monitor {
    Monitor::new(
        Arc::new(source),
        sink,
        RuleThresholds::default(),
        LegacyThresholds::default(),
    )
    .unwrap()
    .with_clock(Arc::new(FixedClock(now)))
}

pub fn config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("META_ACCESS_TOKEN", "EAAB-token"),
        ("AD_ACCOUNT_ID", "42"),
        ("TELEGRAM_BOT_TOKEN", "123:ABC"),
        ("TELEGRAM_CHAT_ID", "-100555"),
        ("CRON_SECRET", SECRET),
        // Nothing listens here; the toggle self-call fails fast.
        ("PUBLIC_BASE_URL", "http://127.0.0.1:9"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(&|key: &str| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub fn app_state(source: MockSource, sink: Arc<RecordingSink>, now: DateTime<Utc>) -> Arc<AppState> {
    Arc::new(AppState::new(
        config(),
        Arc::new(monitor(source, sink, now)),
        ScheduleMode::Production,
    ))
}
