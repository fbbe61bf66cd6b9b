//! `Monitor` runs against a scripted source and a recording sink.

mod common;

use std::sync::Arc;

use adwatch_core::{Severity, TokenStatus};
use adwatch_rules::checks::CpaStatus;
use adwatch_server::runner::MONITORING_ERROR_KEY;
use adwatch_server::RunOutcome;
use chrono::Duration;
use common::*;

fn keys(outcome: &RunOutcome) -> Vec<&str> {
    outcome.alerts().iter().map(|a| a.key.as_str()).collect()
}

/// $600 of $1000 two hours into the window.
fn early_overspend() -> MockSource {
    MockSource {
        account_spend: 600.0,
        ..MockSource::default()
    }
}

#[tokio::test]
async fn early_overspend_fires_pacing_and_burst() {
    let sink = Arc::new(RecordingSink::default());
    let monitor = monitor(early_overspend(), sink.clone(), at_local_hour(10));

    let outcome = monitor.run_checks().await;
    assert!(outcome.is_ok());
    assert_eq!(
        keys(&outcome),
        vec![
            "pacing_irregular_basic",
            "pacing_hourly_limit",
            "pacing_velocity_high",
            "spending_burst_detected",
        ]
    );

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 4);
    for alert in &calls[0] {
        let ctx = alert.spend_context.as_ref().expect("spend context attached");
        assert_eq!(ctx.total_spend, 600.0);
        assert_eq!(ctx.daily_budget, 1000.0);
        assert_eq!(ctx.current_hour, 10);
        assert_eq!(ctx.day_progress_percent, 13);
    }

    match outcome {
        RunOutcome::Completed { summary, delivered, .. } => {
            assert!(delivered);
            assert_eq!(summary.spend_percent, 60.0);
            assert_eq!(summary.segment_count, 1);
            assert_eq!(summary.day_progress_percent, 13);
            assert!(summary.token_valid);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn inactive_campaigns_suppress_delivery() {
    let sink = Arc::new(RecordingSink::default());
    let source = MockSource {
        campaigns_active: false,
        ..early_overspend()
    };
    let outcome = monitor(source, sink.clone(), at_local_hour(10)).run_checks().await;

    assert_eq!(outcome.alerts().len(), 4);
    assert!(sink.calls().is_empty());
    assert!(matches!(outcome, RunOutcome::Completed { delivered: false, .. }));
}

#[tokio::test]
async fn quiet_run_sends_nothing() {
    let sink = Arc::new(RecordingSink::default());
    // 30% at 11:00 (progress 20%): under every gate.
    let source = MockSource {
        account_spend: 300.0,
        ..MockSource::default()
    };
    let outcome = monitor(source, sink.clone(), at_local_hour(11)).run_checks().await;

    assert!(outcome.alerts().is_empty());
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn summary_appended_at_report_hour() {
    let sink = Arc::new(RecordingSink::default());
    let source = MockSource {
        account_spend: 300.0,
        account_cpa: 60.0,
        ..MockSource::default()
    };
    let outcome = monitor(source, sink.clone(), at_local_hour(12)).run_checks().await;

    assert_eq!(keys(&outcome), vec!["daily_summary_midday"]);
    let summary = &outcome.alerts()[0];
    assert!(summary.is_summary);
    assert_eq!(summary.severity, Severity::Info);
    assert!(summary.spend_context.is_none());
    assert!(summary.detail.contains("Midday Summary"));
    assert_eq!(sink.calls().len(), 1);
}

#[tokio::test]
async fn no_summary_without_records() {
    let sink = Arc::new(RecordingSink::default());
    let source = MockSource {
        records: Vec::new(),
        account_spend: 300.0,
        ..MockSource::default()
    };
    let outcome = monitor(source, sink.clone(), at_local_hour(17)).run_checks().await;
    assert!(outcome.alerts().is_empty());
}

#[tokio::test]
async fn token_alert_leads_and_is_not_enriched() {
    let now = at_local_hour(10);
    let sink = Arc::new(RecordingSink::default());
    let source = MockSource {
        token: TokenStatus {
            expires_at: (now + Duration::days(3)).timestamp(),
            ..TokenStatus::never_expires()
        },
        account_spend: 600.0,
        ..MockSource::default()
    };
    let outcome = monitor(source, sink.clone(), now).run_checks().await;

    let first = &outcome.alerts()[0];
    assert_eq!(first.key, "token_expiring");
    assert_eq!(first.severity, Severity::Critical);
    assert!(first.spend_context.is_none());
    assert!(first.detail.contains("3 days"));
}

#[tokio::test]
async fn fetch_failure_delivers_single_error_alert() {
    let sink = Arc::new(RecordingSink::default());
    let source = MockSource {
        fail_with: Some("Invalid OAuth access token.".into()),
        ..MockSource::default()
    };
    let outcome = monitor(source, sink.clone(), at_local_hour(10)).run_checks().await;

    assert!(!outcome.is_ok());
    assert!(outcome.error().unwrap().contains("Invalid OAuth access token."));

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1);
    let alert = &calls[0][0];
    assert_eq!(alert.key, MONITORING_ERROR_KEY);
    assert_eq!(alert.title, "🚨 Monitoring System Error");
    assert_eq!(alert.severity, Severity::Critical);
    assert!(alert.detail.starts_with("Failed to run monitoring checks: "));
}

#[tokio::test]
async fn identical_inputs_give_identical_alerts() {
    let a = monitor(early_overspend(), Arc::new(RecordingSink::default()), at_local_hour(10))
        .run_checks()
        .await;
    let b = monitor(early_overspend(), Arc::new(RecordingSink::default()), at_local_hour(10))
        .run_checks()
        .await;
    assert_eq!(a.alerts(), b.alerts());
}

#[tokio::test]
async fn status_reports_top_spenders() {
    let sink = Arc::new(RecordingSink::default());
    let source = MockSource {
        records: vec![
            record("1", "Small", 20.0, 1.0, 0.0),
            record("2", "Large", 200.0, 2.5, 3.0),
            record("3", "Medium", 80.0, 1.8, 1.0),
            record("4", "Tiny", 5.0, 0.4, 0.0),
        ],
        account_spend: 250.0,
        account_cpa: 62.5,
        daily_budget: 500.0,
        ..MockSource::default()
    };
    let report = monitor(source, sink.clone(), at_local_hour(14)).status().await.unwrap();

    assert_eq!(report.spend.total, 250.0);
    assert_eq!(report.spend.percentage, 50.0);
    assert_eq!(report.spend.remaining, 250.0);
    assert_eq!(report.performance.purchases, 4);
    assert_eq!(report.performance.cpa_status, CpaStatus::OnTarget);
    assert_eq!(report.segments.count, 4);
    let names: Vec<&str> = report.segments.top_spenders.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Large", "Medium", "Small"]);
    assert_eq!(report.business_day.current_hour, 14);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn legacy_checks_compare_windows() {
    let sink = Arc::new(RecordingSink::default());
    let source = MockSource {
        records: vec![
            record("1", "Prospecting", 300.0, 1.0, 0.0),
            record("2", "Retargeting", 40.0, 3.0, 0.0),
        ],
        prior_records: vec![
            record("1", "Prospecting", 280.0, 2.0, 0.0),
            record("2", "Retargeting", 40.0, 3.1, 0.0),
        ],
        ..MockSource::default()
    };
    let ranges = source.ranges.clone();
    let alerts = monitor(source, sink.clone(), at_local_hour(9))
        .run_legacy_checks()
        .await
        .unwrap();

    let keys: Vec<&str> = alerts.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys, vec!["high_spend:1", "ctr_drop:1"]);
    assert_eq!(sink.calls().len(), 1);

    let ranges = ranges.lock().unwrap();
    assert_eq!(ranges.len(), 2);
    assert!(ranges.iter().any(|r| r.until == today()));
}

#[tokio::test]
async fn forced_summary_uses_given_label() {
    let sink = Arc::new(RecordingSink::default());
    let alerts = monitor(MockSource::default(), sink.clone(), at_local_hour(15))
        .send_summary_now(Some("Afternoon"))
        .await
        .unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].key, "daily_summary_afternoon");
    assert_eq!(sink.calls().len(), 1);
}
