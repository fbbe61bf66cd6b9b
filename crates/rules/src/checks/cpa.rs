use adwatch_core::{Alert, Severity};
use serde::{Deserialize, Serialize};

use super::RuleInput;

/// How far `cpa` sits above `target`, in percent. Negative when below.
pub fn percent_over_target(cpa: f64, target: f64) -> f64 {
    if target > 0.0 {
        (cpa / target - 1.0) * 100.0
    } else {
        0.0
    }
}

/// Coarse CPA standing used by reports and the status view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpaStatus {
    OnTarget,
    AboveTarget,
    NoPurchases,
}

impl CpaStatus {
    /// A CPA of zero or less means nothing has converted yet.
    pub fn classify(cpa: f64, target: f64) -> Self {
        if cpa <= 0.0 {
            Self::NoPurchases
        } else if cpa <= target {
            Self::OnTarget
        } else {
            Self::AboveTarget
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTarget => "on_target",
            Self::AboveTarget => "above_target",
            Self::NoPurchases => "no_purchases",
        }
    }
}

/// Warning when account CPA reaches `target * multiplier`. Not judged until
/// enough of the budget has been spent for the number to be meaningful.
pub fn cpa_performance(input: &RuleInput<'_>) -> Vec<Alert> {
    let t = &input.thresholds.cpa;
    if input.spend_percent() < t.min_spend_percent {
        return Vec::new();
    }

    let cpa = input.snapshot.account.cpa;
    if cpa <= 0.0 || cpa < t.target_cpa * t.alert_multiplier {
        return Vec::new();
    }

    vec![Alert::new(
        "cpa_above_target",
        "💰 CPA Above Target",
        format!(
            "${cpa:.0} CPA (target: ${:.0}) - {:.0}% above target",
            t.target_cpa,
            percent_over_target(cpa, t.target_cpa)
        ),
        Severity::Warning,
    )]
}
