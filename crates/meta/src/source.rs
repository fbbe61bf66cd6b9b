use adwatch_core::{MetricsRecord, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Inclusive calendar-date range, in the account's reporting timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            since: date,
            until: date,
        }
    }
}

/// Everything the watchdog reads from the advertising platform.
///
/// Every fetch is independent; the orchestrator issues them concurrently.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn token_status(&self) -> Result<TokenStatus, SourceError>;

    /// Per-segment (ad set) rows for `range`, one row per segment per day.
    async fn segment_insights(&self, range: DateRange) -> Result<Vec<MetricsRecord>, SourceError>;

    async fn todays_records(&self, today: NaiveDate) -> Result<Vec<MetricsRecord>, SourceError> {
        self.segment_insights(DateRange::day(today)).await
    }

    /// Aggregate daily budget in account currency.
    async fn daily_budget(&self, today: NaiveDate) -> Result<f64, SourceError>;

    async fn account_spend(&self, today: NaiveDate) -> Result<f64, SourceError>;

    /// Account cost per purchase for `today`; 0 with no purchases.
    async fn account_cpa(&self, today: NaiveDate) -> Result<f64, SourceError>;

    async fn campaigns_active(&self) -> Result<bool, SourceError>;
}
