//! Turns an alert list into paced chat messages.
//!
//! Summaries go out first, one message each. Regular alerts follow in
//! batches of [`DEFAULT_BATCH_SIZE`]. A fixed pause separates consecutive
//! messages. Individual channel failures are logged and never block later
//! messages or other channels.

use std::time::{Duration, Instant};

use adwatch_core::Alert;

use crate::templating::MessageRenderer;
use crate::traits::{
    AlertSink, DeliveryReport, DispatchResult, MessageKind, Notification, Notifier, NotifyError,
};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_SUMMARY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1500);

/// Delivers alerts to every configured channel.
pub struct AlertDispatcher {
    channels: Vec<Box<dyn Notifier>>,
    renderer: MessageRenderer,
    batch_size: usize,
    summary_delay: Duration,
    batch_delay: Duration,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Result<Self, NotifyError> {
        Ok(Self {
            channels,
            renderer: MessageRenderer::new()?,
            batch_size: DEFAULT_BATCH_SIZE,
            summary_delay: DEFAULT_SUMMARY_DELAY,
            batch_delay: DEFAULT_BATCH_DELAY,
        })
    }

    /// Override the pause after summary and batch messages.
    pub fn with_delays(mut self, summary: Duration, batch: Duration) -> Self {
        self.summary_delay = summary;
        self.batch_delay = batch;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Render the alert list into messages, in send order.
    pub fn render(&self, alerts: &[Alert]) -> Result<Vec<Notification>, NotifyError> {
        let (summaries, regular): (Vec<&Alert>, Vec<&Alert>) =
            alerts.iter().partition(|a| a.is_summary);

        let mut messages = Vec::with_capacity(summaries.len() + regular.len() / self.batch_size + 1);
        for summary in &summaries {
            messages.push(Notification {
                kind: MessageKind::Summary,
                subject: summary.key.clone(),
                body: self.renderer.render_summary(summary)?,
                alert_count: 1,
            });
        }

        let batch_count = regular.len().div_ceil(self.batch_size);
        for (i, batch) in regular.chunks(self.batch_size).enumerate() {
            messages.push(Notification {
                kind: MessageKind::Batch,
                subject: format!("batch {}/{}", i + 1, batch_count),
                body: self.renderer.render_batch(batch)?,
                alert_count: batch.len(),
            });
        }

        Ok(messages)
    }

    /// Send one message to every channel.
    async fn send_to_all(&self, notification: &Notification) -> Vec<DispatchResult> {
        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let start = Instant::now();
            let result = channel.send(notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        channel = channel.channel_name(),
                        subject = %notification.subject,
                        alerts = notification.alert_count,
                        duration_ms,
                        "Message delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.channel_name(),
                        subject = %notification.subject,
                        error = %e,
                        duration_ms,
                        "Message delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                subject: notification.subject.clone(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }

    /// Render and send every message, pausing between consecutive ones.
    pub async fn dispatch(&self, alerts: &[Alert]) -> DeliveryReport {
        if alerts.is_empty() {
            tracing::debug!("No alerts to deliver");
            return DeliveryReport::default();
        }
        if self.channels.is_empty() {
            tracing::warn!(alerts = alerts.len(), "No notification channels configured");
            return DeliveryReport::default();
        }

        let messages = match self.render(alerts) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render alert messages");
                return DeliveryReport {
                    messages: 0,
                    results: vec![DispatchResult {
                        channel: "renderer".to_string(),
                        subject: "render".to_string(),
                        success: false,
                        error: Some(e.to_string()),
                        duration_ms: 0,
                    }],
                };
            }
        };

        tracing::info!(
            alerts = alerts.len(),
            messages = messages.len(),
            channels = self.channels.len(),
            "Delivering alerts"
        );

        let mut report = DeliveryReport {
            messages: messages.len(),
            results: Vec::new(),
        };

        let last = messages.len().saturating_sub(1);
        for (i, message) in messages.iter().enumerate() {
            report.results.extend(self.send_to_all(message).await);
            if i < last {
                let pause = match message.kind {
                    MessageKind::Summary => self.summary_delay,
                    _ => self.batch_delay,
                };
                tokio::time::sleep(pause).await;
            }
        }

        report
    }

    /// Send a test message through every channel.
    pub async fn test_notify(&self) -> Result<(), NotifyError> {
        if self.channels.is_empty() {
            return Err(NotifyError::Config("No notification channels configured".to_string()));
        }
        for channel in &self.channels {
            channel.test().await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AlertSink for AlertDispatcher {
    async fn deliver(&self, alerts: &[Alert]) -> DeliveryReport {
        self.dispatch(alerts).await
    }
}
