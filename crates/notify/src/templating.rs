//! Minijinja rendering of outbound chat messages.
//!
//! Two fixed templates: a summary message wraps a pre-formatted digest in the
//! decorative border; a batch message lists up to a batch's worth of alerts as
//! bullets under a shared header. Bold and italic markers are Telegram
//! legacy Markdown.

use adwatch_core::{Alert, SpendContext};
use serde::Serialize;

use crate::traits::NotifyError;

pub const BATCH_HEADER: &str = "⚠️ Meta Watchdog Alerts";

const SUMMARY_TEMPLATE: &str = "-\n\n\n{{ detail }}\n\n\n-";

const BATCH_TEMPLATE: &str = "-\n\n\n{{ header }}\n\n{% for a in alerts %}\
{% if not loop.first %}\n\n{% endif %}\
• *{{ a.title }}*\n  {{ a.detail }}\
{% if a.context %}\n  _{{ a.context }}_{% endif %}\
{% endfor %}\n\n\n-";

#[derive(Debug, Serialize)]
struct BulletView<'a> {
    title: &'a str,
    detail: &'a str,
    context: Option<String>,
}

/// One-line spend context shown under spend-related bullets.
pub fn context_line(ctx: &SpendContext) -> String {
    format!(
        "${:.2} of ${:.2} spent ({:.0}%) at {}:00, {}% through the day",
        ctx.total_spend, ctx.daily_budget, ctx.spend_percent, ctx.current_hour, ctx.day_progress_percent
    )
}

/// Renders summary and batch messages.
///
/// The templates are static, so the environment is built once and reused.
#[derive(Debug)]
pub struct MessageRenderer {
    env: minijinja::Environment<'static>,
}

impl MessageRenderer {
    pub fn new() -> Result<Self, NotifyError> {
        let mut env = minijinja::Environment::new();
        env.add_template("summary", SUMMARY_TEMPLATE)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        env.add_template("batch", BATCH_TEMPLATE)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(Self { env })
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, NotifyError> {
        self.env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// A summary alert as its own bordered message.
    pub fn render_summary(&self, alert: &Alert) -> Result<String, NotifyError> {
        self.render("summary", minijinja::context! { detail => &alert.detail })
    }

    /// A group of regular alerts as one bulleted message.
    pub fn render_batch(&self, alerts: &[&Alert]) -> Result<String, NotifyError> {
        let bullets: Vec<BulletView<'_>> = alerts
            .iter()
            .map(|a| BulletView {
                title: &a.title,
                detail: &a.detail,
                context: a.spend_context.as_ref().map(context_line),
            })
            .collect();
        self.render(
            "batch",
            minijinja::context! { header => BATCH_HEADER, alerts => &bullets },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwatch_core::Severity;

    fn renderer() -> MessageRenderer {
        MessageRenderer::new().unwrap()
    }

    #[test]
    fn summary_is_wrapped_in_border() {
        let alert = Alert::summary("daily_summary_midday", "📊 Midday Summary Report", "📊 *Midday Summary*\n⏰ 12:00 EST\n");
        let text = renderer().render_summary(&alert).unwrap();
        assert_eq!(text, "-\n\n\n📊 *Midday Summary*\n⏰ 12:00 EST\n\n\n\n-");
    }

    #[test]
    fn batch_lists_bullets_under_header() {
        let a = Alert::new("token_expiring", "🚨 Token Expiring Soon", "expires in 3 days", Severity::Critical);
        let b = Alert::new("x", "Second", "more detail", Severity::Info);
        let text = renderer().render_batch(&[&a, &b]).unwrap();
        assert_eq!(
            text,
            "-\n\n\n⚠️ Meta Watchdog Alerts\n\n\
             • *🚨 Token Expiring Soon*\n  expires in 3 days\n\n\
             • *Second*\n  more detail\n\n\n-"
        );
    }

    #[test]
    fn spend_context_adds_italic_line() {
        let a = Alert::new("pacing_slow", "🐌 Spending Too Slow", "Only 10% spent", Severity::Warning)
            .with_spend_context(SpendContext {
                total_spend: 20.0,
                spend_percent: 10.0,
                daily_budget: 200.0,
                current_hour: 17,
                day_progress_percent: 60,
            });
        let text = renderer().render_batch(&[&a]).unwrap();
        assert!(text.contains(
            "• *🐌 Spending Too Slow*\n  Only 10% spent\n  _$20.00 of $200.00 spent (10%) at 17:00, 60% through the day_\n\n\n-"
        ));
    }

    #[test]
    fn values_are_not_html_escaped() {
        let a = Alert::new("k", "A & B", "x < y", Severity::Info);
        let text = renderer().render_batch(&[&a]).unwrap();
        assert!(text.contains("• *A & B*\n  x < y"));
    }
}
