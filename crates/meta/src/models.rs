//! Graph API wire shapes.
//!
//! The Graph API encodes most numbers as strings. Fields are kept as raw
//! JSON values here and converted once, at [`InsightRow::into_record`] and
//! friends, with anything missing or garbled reading as 0.

use adwatch_core::{ConversionAction, MetricsRecord, TokenStatus};
use serde::Deserialize;
use serde_json::Value;

/// Lenient numeric read: accepts numbers and numeric strings.
pub fn number(value: &Option<Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n.max(0.0)
    } else {
        0.0
    }
}

fn count(value: &Option<Value>) -> u64 {
    number(value).trunc() as u64
}

// ── Envelopes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: GraphError,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

// ── Insights ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct WireAction {
    pub action_type: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightRow {
    #[serde(default)]
    pub adset_id: Option<String>,
    #[serde(default)]
    pub adset_name: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub spend: Option<Value>,
    #[serde(default)]
    pub impressions: Option<Value>,
    #[serde(default)]
    pub clicks: Option<Value>,
    #[serde(default)]
    pub ctr: Option<Value>,
    #[serde(default)]
    pub cpc: Option<Value>,
    #[serde(default)]
    pub actions: Vec<WireAction>,
}

impl InsightRow {
    pub fn spend(&self) -> f64 {
        number(&self.spend)
    }

    pub fn actions(&self) -> Vec<ConversionAction> {
        self.actions
            .iter()
            .map(|a| ConversionAction {
                action_type: a.action_type.clone(),
                value: number(&a.value),
            })
            .collect()
    }

    pub fn into_record(self) -> MetricsRecord {
        let actions = self.actions();
        MetricsRecord {
            segment_id: self.adset_id.unwrap_or_default(),
            segment_name: self.adset_name.unwrap_or_default(),
            spend: number(&self.spend),
            impressions: count(&self.impressions),
            clicks: count(&self.clicks),
            ctr: number(&self.ctr),
            cpc: number(&self.cpc),
            actions,
        }
    }
}

// ── Campaigns ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignRow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub effective_status: Option<String>,
    /// Minor currency units (cents).
    #[serde(default)]
    pub daily_budget: Option<Value>,
    /// Minor currency units (cents).
    #[serde(default)]
    pub lifetime_budget: Option<Value>,
}

impl CampaignRow {
    pub fn is_active(&self) -> bool {
        self.effective_status
            .as_deref()
            .or(self.status.as_deref())
            .is_some_and(|s| s == "ACTIVE")
    }
}

// ── Tokens ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DebugTokenEnvelope {
    pub data: DebugTokenData,
}

#[derive(Debug, Deserialize)]
pub struct DebugTokenData {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub expires_at: i64,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl From<DebugTokenData> for TokenStatus {
    fn from(d: DebugTokenData) -> Self {
        TokenStatus {
            is_valid: d.is_valid,
            expires_at: d.expires_at,
            app_id: d.app_id,
            scopes: d.scopes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until expiry, when the platform reports it.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Row type with no `Default` impl, as the client's generic pager sees it.
    #[derive(Debug, Deserialize)]
    struct Row {
        id: String,
    }

    fn page_of<T: serde::de::DeserializeOwned>(value: Value) -> Page<T> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn page_deserializes_for_any_row_type() {
        let page: Page<Row> = page_of(json!({
            "data": [{ "id": "1" }],
            "paging": { "next": "https://graph.example/next" }
        }));
        assert_eq!(page.data[0].id, "1");
        assert!(page.paging.and_then(|p| p.next).is_some());

        let empty: Page<Row> = page_of(json!({}));
        assert!(empty.data.is_empty());
    }

    #[test]
    fn numbers_accept_strings_and_garbage() {
        assert_eq!(number(&Some(json!("12.50"))), 12.5);
        assert_eq!(number(&Some(json!(3))), 3.0);
        assert_eq!(number(&Some(json!("n/a"))), 0.0);
        assert_eq!(number(&Some(json!(null))), 0.0);
        assert_eq!(number(&None), 0.0);
    }

    #[test]
    fn insight_row_converts_to_record() {
        let row: InsightRow = serde_json::from_value(json!({
            "adset_id": "120",
            "adset_name": "Retargeting",
            "spend": "45.10",
            "impressions": "1200",
            "clicks": "36",
            "ctr": "3.0",
            "cpc": "1.25",
            "actions": [
                { "action_type": "link_click", "value": "36" },
                { "action_type": "offsite_conversion.fb_pixel_purchase", "value": "2" }
            ],
            "date_start": "2026-10-14"
        }))
        .unwrap();

        let r = row.into_record();
        assert_eq!(r.segment_id, "120");
        assert_eq!(r.spend, 45.1);
        assert_eq!(r.impressions, 1200);
        assert_eq!(r.clicks, 36);
        assert_eq!(r.purchases(), 2);
    }

    #[test]
    fn effective_status_wins_over_status() {
        let row: CampaignRow = serde_json::from_value(json!({
            "id": "1", "status": "ACTIVE", "effective_status": "CAMPAIGN_PAUSED"
        }))
        .unwrap();
        assert!(!row.is_active());

        let row: CampaignRow =
            serde_json::from_value(json!({ "id": "2", "status": "ACTIVE" })).unwrap();
        assert!(row.is_active());
    }
}
