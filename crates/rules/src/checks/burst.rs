use adwatch_core::{Alert, Severity};

use super::RuleInput;

/// Warning when a large share of the budget is gone early in the business day.
pub fn spending_burst(input: &RuleInput<'_>) -> Vec<Alert> {
    let burst = &input.thresholds.pacing.burst;
    if !burst.enabled || !input.day.is_business_hours {
        return Vec::new();
    }

    let progress = f64::from(input.day.progress_percent);
    let spend_percent = input.spend_percent();
    if progress >= burst.early_progress_percent || spend_percent <= burst.early_spend_percent {
        return Vec::new();
    }

    vec![Alert::new(
        "spending_burst_detected",
        "💥 Spending Burst Detected",
        format!(
            "Rapid spending detected: {spend_percent:.1}% of budget spent in early hours ({}% of day). \
             This may indicate a spending burst that could exhaust budget prematurely.",
            input.day.progress_percent
        ),
        Severity::Warning,
    )]
}
