//! CLI argument parsing and subcommand dispatch.

use std::sync::Arc;

use adwatch_core::Config;
use adwatch_meta::{MetaClient, MetricsSource};
use adwatch_notify::{AlertDispatcher, TelegramNotifier};
use adwatch_rules::{RuleThresholds, ScheduleMode};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::router::build_router;
use crate::runner::Monitor;
use crate::scheduler::run_schedule_loop;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "adwatch", version, about = "Meta ad account watchdog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server and the in-process scheduler (default).
    Serve,
    /// Run one monitoring pass and print the outcome as JSON.
    Run,
    /// Print today's spend, CPA and business-day position.
    Status,
    /// Run the per-segment high-spend and CTR-drop checks.
    Legacy,
    /// Build and send a summary report now.
    Summary {
        /// Report label, e.g. "Midday". Defaults to the scheduled slot label.
        #[arg(long)]
        label: Option<String>,
    },
    /// Send a test message to every notification channel.
    TestNotify,
    /// Inspect or renew the Meta access token.
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Show validity, expiry and scopes of the configured token.
    Check,
    /// Exchange a short-lived user token for a long-lived one.
    Exchange {
        short_token: String,
        /// Meta app secret; prefer the env var so it stays out of shell history.
        #[arg(long, env = "META_APP_SECRET", hide_env_values = true)]
        app_secret: String,
    },
}

/// Long-lived collaborators shared by every subcommand.
pub struct Services {
    pub meta: Arc<MetaClient>,
    pub dispatcher: Arc<AlertDispatcher>,
    pub monitor: Arc<Monitor>,
}

impl Services {
    pub fn build(config: &Config, thresholds: RuleThresholds) -> anyhow::Result<Self> {
        let meta = Arc::new(MetaClient::new(&config.meta));
        let telegram = TelegramNotifier::from_config(&config.telegram)?;
        let dispatcher = Arc::new(AlertDispatcher::new(vec![Box::new(telegram)])?);
        let monitor = Monitor::new(
            meta.clone(),
            dispatcher.clone(),
            thresholds,
            config.legacy.clone(),
        )?;
        Ok(Self {
            meta,
            dispatcher,
            monitor: Arc::new(monitor),
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute the chosen subcommand.
pub async fn dispatch(cli: Cli, config: Config, thresholds: RuleThresholds) -> anyhow::Result<()> {
    let services = Services::build(&config, thresholds)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, services).await,
        Command::Run => {
            let outcome = services.monitor.run_checks().await;
            print_json(&outcome)?;
            match outcome.error() {
                Some(error) => anyhow::bail!("monitoring run failed: {error}"),
                None => Ok(()),
            }
        }
        Command::Status => {
            let report = services.monitor.status().await?;
            let headline = report.headline(services.monitor.calendar().label());
            print_json(&serde_json::json!({ "status": report, "summary": headline }))
        }
        Command::Legacy => {
            let alerts = services.monitor.run_legacy_checks().await?;
            info!(alerts = alerts.len(), "Legacy checks complete");
            print_json(&alerts)
        }
        Command::Summary { label } => {
            let alerts = services.monitor.send_summary_now(label.as_deref()).await?;
            print_json(&alerts)
        }
        Command::TestNotify => {
            services.dispatcher.test_notify().await?;
            println!("Test message sent to {} channel(s)", services.dispatcher.channel_count());
            Ok(())
        }
        Command::Token { action } => token(&services, action).await,
    }
}

async fn token(services: &Services, action: TokenCommand) -> anyhow::Result<()> {
    match action {
        TokenCommand::Check => {
            let status = services.meta.token_status().await?;
            let days_left = (status.expires_at != 0)
                .then(|| (status.expires_at - Utc::now().timestamp()) as f64 / 86_400.0);
            print_json(&serde_json::json!({
                "is_valid": status.is_valid,
                "expires_at": status.expires_at,
                "never_expires": status.expires_at == 0,
                "days_left": days_left.map(|d| (d * 10.0).round() / 10.0),
                "app_id": status.app_id,
                "scopes": status.scopes,
            }))
        }
        TokenCommand::Exchange {
            short_token,
            app_secret,
        } => {
            let exchanged = services.meta.exchange_token(&short_token, &app_secret).await?;
            print_json(&exchanged)?;
            println!("Set META_ACCESS_TOKEN to the new access_token value.");
            Ok(())
        }
    }
}

async fn serve(config: Config, services: Services) -> anyhow::Result<()> {
    config.log_summary();

    let mode: ScheduleMode = config.scheduler.mode.parse().map_err(anyhow::Error::msg)?;
    let scheduler_enabled = config.scheduler.enabled;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let port = config.server.port;

    let state = Arc::new(AppState::new(config, services.monitor, mode));

    if scheduler_enabled {
        tokio::spawn(run_schedule_loop(state.clone()));
    } else {
        info!("Scheduler disabled, runs only via /api/cron");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
