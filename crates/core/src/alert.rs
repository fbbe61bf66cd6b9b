//! Alert value objects produced by rule checks and consumed by notifiers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spend figures attached to spend/pacing/CPA alerts for message formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendContext {
    pub total_spend: f64,
    pub spend_percent: f64,
    pub daily_budget: f64,
    pub current_hour: u32,
    pub day_progress_percent: u32,
}

/// Key fragments that mark an alert as spend-related.
const SPEND_KEY_MARKERS: &[&str] = &["spend", "pacing", "cpa"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable identifier for grouping; not unique within a run.
    pub key: String,
    pub title: String,
    /// Pre-formatted for the target message format, may span lines.
    pub detail: String,
    pub severity: Severity,
    /// Scheduled digest rather than a reactive alert.
    #[serde(default)]
    pub is_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend_context: Option<SpendContext>,
}

impl Alert {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            detail: detail.into(),
            severity,
            is_summary: false,
            spend_context: None,
        }
    }

    /// An informational digest delivered as its own message.
    pub fn summary(key: impl Into<String>, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            is_summary: true,
            ..Self::new(key, title, detail, Severity::Info)
        }
    }

    pub fn with_spend_context(self, context: SpendContext) -> Self {
        Self {
            spend_context: Some(context),
            ..self
        }
    }

    /// Whether the key marks this alert as spend, pacing or CPA related.
    pub fn is_spend_related(&self) -> bool {
        SPEND_KEY_MARKERS.iter().any(|m| self.key.contains(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        assert_eq!(Severity::Critical.to_string(), "critical");
    }

    #[test]
    fn spend_related_keys() {
        let make = |key: &str| Alert::new(key, "t", "d", Severity::Warning);
        assert!(make("pacing_slow").is_spend_related());
        assert!(make("spending_burst_detected").is_spend_related());
        assert!(make("cpa_above_target").is_spend_related());
        assert!(!make("token_expiring").is_spend_related());
        assert!(!make("daily_summary_midday").is_spend_related());
    }

    #[test]
    fn summary_constructor_sets_flag_and_info() {
        let a = Alert::summary("daily_summary_midday", "Midday", "body");
        assert!(a.is_summary);
        assert_eq!(a.severity, Severity::Info);
        assert!(a.spend_context.is_none());
    }
}
