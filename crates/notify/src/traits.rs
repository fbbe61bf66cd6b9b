//! Notifier and sink traits plus shared error types.

use adwatch_core::Alert;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Transport failure. The URL is stripped because it embeds the bot token.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("API rejected message ({status}): {description}")]
    Api { status: u16, description: String },

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Http(e.without_url())
    }
}

/// What a rendered message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Summary,
    Batch,
    Test,
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub kind: MessageKind,
    /// Short label for logs, e.g. the summary key or "batch 2/3".
    pub subject: String,
    pub body: String,
    /// Number of alerts folded into this message.
    pub alert_count: usize,
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Test connectivity with a sample notification.
    async fn test(&self) -> Result<(), NotifyError> {
        let test_notification = Notification {
            kind: MessageKind::Test,
            subject: "test".to_string(),
            body: "✅ Meta Watchdog test message. Alert delivery is working.".to_string(),
            alert_count: 0,
        };
        self.send(&test_notification).await
    }

    /// Human-readable name for this channel (e.g., "telegram").
    fn channel_name(&self) -> &str;
}

/// Result of delivering one message to one channel.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatchResult {
    pub channel: String,
    pub subject: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Outcome of handing an alert list to a sink.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DeliveryReport {
    /// Messages rendered from the alert list.
    pub messages: usize,
    pub results: Vec<DispatchResult>,
}

impl DeliveryReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    pub fn all_delivered(&self) -> bool {
        self.failures() == 0
    }
}

/// Where a monitoring run hands its alerts.
///
/// Delivery problems are reported, never raised: one failed message must not
/// stop the rest.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alerts: &[Alert]) -> DeliveryReport;
}
