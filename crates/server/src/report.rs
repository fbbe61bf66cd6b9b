//! Read-only status view of today's account performance.

use adwatch_core::MetricsRecord;
use adwatch_rules::checks::CpaStatus;
use adwatch_rules::BusinessDayState;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SpendStatus {
    pub total: f64,
    pub daily_budget: f64,
    pub percentage: f64,
    /// Negative once the budget is overspent.
    pub remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStatus {
    pub purchases: u64,
    pub cpa: f64,
    pub target_cpa: f64,
    pub cpa_status: CpaStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSpender {
    pub name: String,
    pub spend: f64,
    pub ctr: f64,
    pub cpc: f64,
}

impl From<&MetricsRecord> for TopSpender {
    fn from(r: &MetricsRecord) -> Self {
        Self {
            name: r.segment_name.clone(),
            spend: r.spend,
            ctr: r.ctr,
            cpc: r.cpc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentStatus {
    pub count: usize,
    /// At most three, highest spend first.
    pub top_spenders: Vec<TopSpender>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub timestamp: DateTime<Utc>,
    pub timezone: String,
    pub business_day: BusinessDayState,
    pub spend: SpendStatus,
    pub performance: PerformanceStatus,
    pub segments: SegmentStatus,
}

/// One-line renderings of the report for humans.
#[derive(Debug, Clone, Serialize)]
pub struct StatusHeadline {
    pub spend: String,
    pub cpa: String,
    pub purchases: u64,
    pub business_day: String,
}

impl StatusReport {
    pub fn headline(&self, tz_label: &str) -> StatusHeadline {
        StatusHeadline {
            spend: format!(
                "${:.2} ({:.1}% of budget)",
                self.spend.total, self.spend.percentage
            ),
            cpa: format!("${:.2}", self.performance.cpa),
            purchases: self.performance.purchases,
            business_day: format!(
                "{}% complete ({}:00 {tz_label})",
                self.business_day.progress_percent, self.business_day.current_hour
            ),
        }
    }
}
