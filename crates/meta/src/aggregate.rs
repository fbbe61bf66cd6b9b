//! Account-level aggregates computed from raw Graph rows.

use std::collections::HashSet;

use adwatch_core::PURCHASE_ACTION_TYPES;

use crate::models::{number, CampaignRow, InsightRow};

/// Lifetime budgets are spread over this many days when estimating a daily
/// figure.
pub const LIFETIME_BUDGET_DAYS: f64 = 30.0;

/// Sum of daily budgets for campaigns that are active or spent today.
///
/// Budgets arrive in cents. A campaign with only a lifetime budget counts
/// as `lifetime / 100 / 30`. Returns 0 when nothing qualifies; the caller
/// substitutes its fallback.
pub fn daily_budget(campaigns: &[CampaignRow], spent_today: &HashSet<String>) -> f64 {
    campaigns
        .iter()
        .filter(|c| c.is_active() || spent_today.contains(&c.id))
        .map(|c| {
            let daily = number(&c.daily_budget);
            if daily > 0.0 {
                daily / 100.0
            } else {
                number(&c.lifetime_budget) / 100.0 / LIFETIME_BUDGET_DAYS
            }
        })
        .sum()
}

/// Campaign ids with positive spend in campaign-level insight rows.
pub fn campaigns_with_spend(rows: &[InsightRow]) -> HashSet<String> {
    rows.iter()
        .filter(|r| r.spend() > 0.0)
        .filter_map(|r| r.campaign_id.clone())
        .collect()
}

/// Purchases in one row: the first purchase-type action, truncated.
fn row_purchases(row: &InsightRow) -> u64 {
    row.actions
        .iter()
        .find(|a| PURCHASE_ACTION_TYPES.contains(&a.action_type.as_str()))
        .map(|a| number(&a.value).trunc() as u64)
        .unwrap_or(0)
}

/// Spend divided by purchases across account-level rows; 0 with no purchases.
pub fn cost_per_purchase(rows: &[InsightRow]) -> f64 {
    let spend: f64 = rows.iter().map(InsightRow::spend).sum();
    let purchases: u64 = rows.iter().map(row_purchases).sum();
    if purchases > 0 {
        spend / purchases as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn campaign(v: serde_json::Value) -> CampaignRow {
        serde_json::from_value(v).unwrap()
    }

    fn insight(v: serde_json::Value) -> InsightRow {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn budget_counts_active_and_spending_campaigns() {
        let campaigns = vec![
            campaign(json!({ "id": "a", "effective_status": "ACTIVE", "daily_budget": "15000" })),
            campaign(json!({ "id": "b", "effective_status": "PAUSED", "daily_budget": "5000" })),
            campaign(json!({ "id": "c", "effective_status": "PAUSED", "lifetime_budget": "300000" })),
            campaign(json!({ "id": "d", "effective_status": "PAUSED", "daily_budget": "9900" })),
        ];
        let spent: HashSet<String> = ["b".to_string(), "c".to_string()].into_iter().collect();

        // 150 + 50 + 3000/30
        assert_eq!(daily_budget(&campaigns, &spent), 300.0);
    }

    #[test]
    fn budget_zero_when_nothing_qualifies() {
        let campaigns = vec![campaign(json!({ "id": "a", "status": "PAUSED", "daily_budget": "1000" }))];
        assert_eq!(daily_budget(&campaigns, &HashSet::new()), 0.0);
    }

    #[test]
    fn spend_set_skips_zero_rows() {
        let rows = vec![
            insight(json!({ "campaign_id": "a", "spend": "10.00" })),
            insight(json!({ "campaign_id": "b", "spend": "0" })),
        ];
        let set = campaigns_with_spend(&rows);
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
    }

    #[test]
    fn cpa_uses_first_purchase_action() {
        let rows = vec![insight(json!({
            "spend": "300",
            "actions": [
                { "action_type": "purchase", "value": "3" },
                { "action_type": "offsite_conversion.fb_pixel_purchase", "value": "3" }
            ]
        }))];
        assert_eq!(cost_per_purchase(&rows), 100.0);
    }

    #[test]
    fn cpa_zero_without_purchases() {
        let rows = vec![insight(json!({ "spend": "300", "actions": [] }))];
        assert_eq!(cost_per_purchase(&rows), 0.0);
        assert_eq!(cost_per_purchase(&[]), 0.0);
    }
}
