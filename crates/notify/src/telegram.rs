//! Telegram Bot API notifier.
//!
//! Delivers notifications via the Bot API `sendMessage` endpoint. Message
//! bodies carry `*bold*` and `_italic_` markers, so the default parse mode is
//! legacy `Markdown`.

use adwatch_core::config::TelegramConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::traits::{Notification, Notifier, NotifyError};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Sends notifications via the Telegram Bot API.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    parse_mode: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .field("parse_mode", &self.parse_mode)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Returns [`NotifyError::Config`] if the token or chat id is empty.
    pub fn new(
        bot_token: String,
        chat_id: String,
        parse_mode: Option<String>,
    ) -> Result<Self, NotifyError> {
        if bot_token.trim().is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        if chat_id.trim().is_empty() {
            return Err(NotifyError::Config(
                "Telegram chat id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            bot_token,
            chat_id,
            parse_mode,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, NotifyError> {
        Self::new(
            config.bot_token.clone(),
            config.chat_id.clone(),
            config.parse_mode.clone(),
        )
    }

    /// Point at a different Bot API host (self-hosted Bot API server, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

/// Retry hint used when a 429 reply carries no `retry_after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// The Bot API envelope; only the failure fields matter here.
#[derive(Debug, Default, Deserialize)]
struct BotReply {
    #[serde(default)]
    ok: bool,
    description: Option<String>,
    parameters: Option<ReplyParameters>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyParameters {
    retry_after: Option<u64>,
}

impl BotReply {
    fn into_error(self, status: StatusCode) -> NotifyError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return NotifyError::RateLimited {
                retry_after_secs: self
                    .parameters
                    .and_then(|p| p.retry_after)
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            };
        }
        NotifyError::Api {
            status: status.as_u16(),
            description: self
                .description
                .unwrap_or_else(|| format!("Telegram returned {status} without a description")),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: &notification.body,
            parse_mode: self.parse_mode.as_deref(),
        };

        debug!(
            chat_id = %self.chat_id,
            subject = %notification.subject,
            chars = notification.body.chars().count(),
            "Sending Telegram message"
        );

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        // A non-JSON body (proxy error page) still maps to an API error below.
        let reply: BotReply = response.json().await.unwrap_or_default();

        if reply.ok {
            info!(chat_id = %self.chat_id, subject = %notification.subject, "Telegram message sent");
            Ok(())
        } else {
            Err(reply.into_error(status))
        }
    }

    fn channel_name(&self) -> &str {
        "telegram"
    }
}
