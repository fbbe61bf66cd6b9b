//! Per-segment checks from the first version of the watchdog, reachable only
//! through the dedicated legacy run.

use std::collections::HashMap;

use adwatch_core::{Alert, MetricsRecord, Severity};

/// One warning per segment whose spend reached `threshold`.
pub fn high_spend(records: &[MetricsRecord], threshold: f64) -> Vec<Alert> {
    records
        .iter()
        .filter(|r| r.spend >= threshold)
        .map(|r| {
            Alert::new(
                format!("high_spend:{}", r.segment_id),
                format!("High spend: {}", r.segment_name),
                format!("Spend {:.2} ≥ threshold {threshold}", r.spend),
                Severity::Warning,
            )
        })
        .collect()
}

/// One info alert per segment whose CTR fell by at least `drop_pct` percent
/// against the prior period. Segments with no prior row or a zero prior CTR
/// are skipped. When the prior period has several rows for a segment the
/// last one wins.
pub fn ctr_drop(current: &[MetricsRecord], prior: &[MetricsRecord], drop_pct: f64) -> Vec<Alert> {
    let prior: HashMap<&str, &MetricsRecord> =
        prior.iter().map(|r| (r.segment_id.as_str(), r)).collect();

    current
        .iter()
        .filter_map(|c| {
            let prev = prior.get(c.segment_id.as_str())?;
            if prev.ctr <= 0.0 {
                return None;
            }
            let drop = (prev.ctr - c.ctr) / prev.ctr * 100.0;
            (drop >= drop_pct).then(|| {
                Alert::new(
                    format!("ctr_drop:{}", c.segment_id),
                    format!("CTR ↓ {drop:.0}%: {}", c.segment_name),
                    format!("Prev CTR {:.2}% → Now {:.2}%", prev.ctr, c.ctr),
                    Severity::Info,
                )
            })
        })
        .collect()
}
