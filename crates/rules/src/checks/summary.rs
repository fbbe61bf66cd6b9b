use std::fmt::Write as _;

use adwatch_core::Alert;

use super::cpa::{percent_over_target, CpaStatus};
use super::pacing::PacingStatus;
use super::RuleInput;

/// Digest of the day so far, delivered as its own message.
///
/// Returns nothing when there are no per-segment records for today.
pub fn daily_summary(input: &RuleInput<'_>, report_label: &str) -> Vec<Alert> {
    if input.snapshot.records.is_empty() {
        return Vec::new();
    }

    let account = &input.snapshot.account;
    let target = input.thresholds.cpa.target_cpa;
    let spend_percent = input.spend_percent();
    let progress = input.day.progress_percent;

    let mut text = String::new();
    let _ = writeln!(text, "📊 *{report_label} Summary*");
    let _ = writeln!(text, "⏰ {}:00 {}", input.day.current_hour, input.tz_label());
    text.push('\n');
    let _ = writeln!(text, "💰 *Total Spend:* ${:.2}", account.total_spend);
    let _ = writeln!(text, "🎯 *Cost Per Purchase:* ${:.2}", account.cpa);
    text.push('\n');
    text.push_str("📝 *Notes:*\n");

    let _ = match CpaStatus::classify(account.cpa, target) {
        CpaStatus::OnTarget => writeln!(text, "✅ CPA is on target (${target:.0})"),
        CpaStatus::AboveTarget => writeln!(
            text,
            "⚠️ CPA is {:.0}% above target (${target:.0})",
            percent_over_target(account.cpa, target)
        ),
        CpaStatus::NoPurchases => writeln!(text, "📊 No purchases yet"),
    };

    let _ = match PacingStatus::classify(spend_percent, progress) {
        PacingStatus::BudgetNearlyExhausted => {
            writeln!(text, "🚨 Budget nearly exhausted ({spend_percent:.0}% spent)")
        }
        PacingStatus::AheadOfSchedule => writeln!(
            text,
            "⚡ Spending ahead of schedule ({spend_percent:.0}% spent by {progress}% of day)"
        ),
        PacingStatus::BehindSchedule => writeln!(
            text,
            "🐌 Spending behind schedule ({spend_percent:.0}% spent by {progress}% of day)"
        ),
        PacingStatus::OnTrack => writeln!(text, "✅ Spending on track"),
    };

    vec![Alert::summary(
        format!("daily_summary_{}", report_label.to_lowercase()),
        format!("📊 {report_label} Summary Report"),
        text,
    )]
}
