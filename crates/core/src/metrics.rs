//! Typed metrics records produced by a metrics source for one evaluation pass.
//!
//! Everything here is validated and defaulted at the fetch boundary, so rule
//! code can rely on finite, non-negative numbers.

use serde::{Deserialize, Serialize};

/// Conversion action types counted as a purchase when computing CPA.
pub const PURCHASE_ACTION_TYPES: &[&str] = &["purchase", "offsite_conversion.fb_pixel_purchase"];

/// A named conversion action reported for a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionAction {
    pub action_type: String,
    pub value: f64,
}

/// Today's performance for one ad segment (an ad set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub segment_id: String,
    pub segment_name: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    /// Click-through rate in percent.
    pub ctr: f64,
    /// Cost per click.
    pub cpc: f64,
    #[serde(default)]
    pub actions: Vec<ConversionAction>,
}

impl MetricsRecord {
    /// Purchase count for this segment: the first purchase-type action, truncated
    /// to a whole number.
    pub fn purchases(&self) -> u64 {
        self.actions
            .iter()
            .find(|a| PURCHASE_ACTION_TYPES.contains(&a.action_type.as_str()))
            .map(|a| if a.value.is_finite() && a.value > 0.0 { a.value.trunc() as u64 } else { 0 })
            .unwrap_or(0)
    }
}

/// Sum of segment spend.
pub fn total_spend(records: &[MetricsRecord]) -> f64 {
    records.iter().map(|r| r.spend).sum()
}

/// Sum of purchase counts across segments.
pub fn total_purchases(records: &[MetricsRecord]) -> u64 {
    records.iter().map(MetricsRecord::purchases).sum()
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 && whole.is_finite() && part.is_finite() {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Access token validity as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStatus {
    pub is_valid: bool,
    /// Expiry as epoch seconds; 0 means the token never expires.
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokenStatus {
    pub fn never_expires() -> Self {
        Self {
            is_valid: true,
            expires_at: 0,
            app_id: None,
            scopes: Vec::new(),
        }
    }
}

/// Account-level aggregates for today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub total_spend: f64,
    /// Cost per acquisition; 0 when there are no conversions yet.
    pub cpa: f64,
    /// Defaulted to a fallback constant upstream when unknown.
    pub daily_budget: f64,
    pub campaigns_active: bool,
    pub token: TokenStatus,
}

impl AccountSnapshot {
    pub fn spend_percent(&self) -> f64 {
        percent_of(self.total_spend, self.daily_budget)
    }
}

/// Everything a single evaluation pass looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub records: Vec<MetricsRecord>,
    pub account: AccountSnapshot,
}
