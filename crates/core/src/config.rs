use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AdwatchError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Reads env-style keys, trying `{PROFILE}_{KEY}` before `{KEY}`.
struct EnvReader<'a> {
    profile: String,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvReader<'_> {
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|s| !s.trim().is_empty())
    }

    fn opt(&self, key: &str) -> Option<String> {
        if !self.profile.is_empty() {
            if let Some(v) = self.raw(&format!("{}_{}", self.profile, key)) {
                return Some(v);
            }
        }
        self.raw(key)
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.opt(key).ok_or_else(|| AdwatchError::MissingEnv(key.to_string()))
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.opt(key) {
            None => Ok(default),
            Some(v) => v.trim().parse().map_err(|_| AdwatchError::InvalidEnv {
                key: key.to_string(),
                value: v,
            }),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub meta: MetaConfig,
    pub telegram: TelegramConfig,
    /// Shared secret expected in the `secret` query parameter.
    pub cron_secret: String,
    pub legacy: LegacyThresholds,
    pub scheduler: SchedulerConfig,
    /// Optional YAML file overriding the built-in rule thresholds.
    pub rules_file: Option<PathBuf>,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ADWATCH_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Fails on the first missing
    /// required key or unparseable optional value.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let profile = lookup("ADWATCH_PROFILE")
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        let env = EnvReader { profile, lookup };

        let server = ServerConfig::from_reader(&env)?;
        Ok(Self {
            meta: MetaConfig::from_reader(&env)?,
            telegram: TelegramConfig::from_reader(&env)?,
            cron_secret: env.required("CRON_SECRET")?,
            legacy: LegacyThresholds::from_reader(&env)?,
            scheduler: SchedulerConfig::from_reader(&env)?,
            rules_file: env.opt("ADWATCH_RULES_FILE").map(PathBuf::from),
            profile: env.profile.clone(),
            server,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!("  meta:        account={}, api={}", self.meta.ad_account_id, self.meta.api_version);
        tracing::info!("  telegram:    chat_id={}", self.telegram.chat_id);
        tracing::info!(
            "  scheduler:   enabled={}, mode={}",
            self.scheduler.enabled, self.scheduler.mode
        );
        tracing::info!(
            "  rules:       {}",
            self.rules_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "meta": {
                "ad_account_id": self.meta.ad_account_id,
                "api_version": self.meta.api_version,
                "configured": !self.meta.access_token.is_empty(),
            },
            "telegram": {
                "chat_id": self.telegram.chat_id,
                "configured": !self.telegram.bot_token.is_empty(),
            },
            "legacy": {
                "spend_alert_threshold": self.legacy.spend_alert_threshold,
                "ctr_drop_pct": self.legacy.ctr_drop_pct,
                "lookback_days": self.legacy.lookback_days,
            },
            "scheduler": { "enabled": self.scheduler.enabled, "mode": self.scheduler.mode },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Base URL this instance is reachable at, used for self-calls.
    pub public_base_url: String,
}

impl ServerConfig {
    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let port = env.parse("PORT", 3000u16)?;
        Ok(Self {
            host: env.or("HOST", "0.0.0.0"),
            port,
            cors_origin: env.or("CORS_ORIGIN", "*"),
            public_base_url: env
                .opt("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://127.0.0.1:{port}")),
        })
    }
}

// ── Meta Graph API ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MetaConfig {
    pub access_token: String,
    /// Always in `act_<id>` form.
    pub ad_account_id: String,
    pub api_version: String,
    pub graph_url: String,
    /// Used whenever the daily budget cannot be determined.
    pub default_daily_budget: f64,
}

impl MetaConfig {
    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let account = env.required("AD_ACCOUNT_ID")?;
        let ad_account_id = if account.starts_with("act_") {
            account
        } else {
            format!("act_{account}")
        };
        Ok(Self {
            access_token: env.required("META_ACCESS_TOKEN")?,
            ad_account_id,
            api_version: env.or("META_API_VERSION", "v19.0"),
            graph_url: env
                .or("META_GRAPH_URL", "https://graph.facebook.com")
                .trim_end_matches('/')
                .to_string(),
            default_daily_budget: env.parse("DEFAULT_DAILY_BUDGET", 200.0)?,
        })
    }
}

// ── Telegram ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// `None` sends plain text.
    pub parse_mode: Option<String>,
}

impl TelegramConfig {
    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let parse_mode = env.or("TELEGRAM_PARSE_MODE", "Markdown");
        Ok(Self {
            bot_token: env.required("TELEGRAM_BOT_TOKEN")?,
            chat_id: env.required("TELEGRAM_CHAT_ID")?,
            parse_mode: if parse_mode.eq_ignore_ascii_case("none") { None } else { Some(parse_mode) },
        })
    }
}

// ── Legacy rule thresholds ────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyThresholds {
    /// Per-segment spend (currency) that raises a high-spend alert.
    pub spend_alert_threshold: f64,
    /// CTR drop versus the prior period, in percent.
    pub ctr_drop_pct: f64,
    pub lookback_days: u32,
}

impl LegacyThresholds {
    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        Ok(Self {
            spend_alert_threshold: env.parse("SPEND_ALERT_THRESHOLD", 250.0)?,
            ctr_drop_pct: env.parse("CTR_DROP_PCT", 40.0)?,
            lookback_days: env.parse("LOOKBACK_DAYS", 1u32)?.max(1),
        })
    }
}

impl Default for LegacyThresholds {
    fn default() -> Self {
        Self {
            spend_alert_threshold: 250.0,
            ctr_drop_pct: 40.0,
            lookback_days: 1,
        }
    }
}

// ── In-process scheduler ──────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// `production` or `test`.
    pub mode: String,
}

impl SchedulerConfig {
    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let enabled = env.or("ADWATCH_SCHEDULER", "on").to_lowercase();
        let enabled = match enabled.as_str() {
            "on" | "true" | "1" => true,
            "off" | "false" | "0" => false,
            _ => {
                return Err(AdwatchError::InvalidEnv {
                    key: "ADWATCH_SCHEDULER".to_string(),
                    value: enabled,
                })
            }
        };
        let mode = env.or("ADWATCH_SCHEDULE_MODE", "production").to_lowercase();
        if mode != "production" && mode != "test" {
            return Err(AdwatchError::InvalidEnv {
                key: "ADWATCH_SCHEDULE_MODE".to_string(),
                value: mode,
            });
        }
        Ok(Self { enabled, mode })
    }
}
