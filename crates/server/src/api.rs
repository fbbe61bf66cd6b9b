//! HTTP handlers.
//!
//! Every `/api` route requires the shared secret in the `secret` query
//! parameter and answers 401 before doing any work when it is wrong.

use std::sync::Arc;

use adwatch_rules::ScheduleMode;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::runner::RunOutcome;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SecretQuery {
    pub secret: Option<String>,
    /// Cron expression pushed by the toggle endpoint's self-call.
    pub schedule: Option<String>,
}

fn unauthorized(route: &str) -> Response {
    warn!(route, "Unauthorized request");
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response()
}

/// 500 body with `flag: false`, matching the success flag of the route.
fn internal_error(flag: &str, message: String, extra: &[(&str, String)]) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(flag.to_string(), false.into());
    body.insert("error".to_string(), "internal".into());
    body.insert("message".to_string(), message.into());
    for (key, value) in extra {
        body.insert(key.to_string(), value.clone().into());
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::Value::Object(body))).into_response()
}

// ── Health ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub mode: ScheduleMode,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mode: state.schedule.current(),
    })
}

// ── Trigger ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CronResponse {
    pub ok: bool,
    pub alerts: usize,
    pub mode: ScheduleMode,
    pub schedule: &'static str,
    pub timestamp: String,
    pub timezone: String,
}

/// Run one monitoring pass.
pub async fn cron(State(state): State<Arc<AppState>>, Query(q): Query<SecretQuery>) -> Response {
    if !state.authorized(q.secret.as_deref()) {
        return unauthorized("cron");
    }

    if let Some(expr) = q.schedule.as_deref() {
        match ScheduleMode::from_cron(expr) {
            Some(mode) => {
                state.schedule.set(mode);
                info!(schedule = expr, mode = %mode, "Schedule updated");
            }
            None => warn!(schedule = expr, "Ignoring unrecognized schedule"),
        }
    }

    let mode = state.schedule.current();
    info!(mode = %mode, schedule = mode.cron_expression(), "Running triggered check");

    let outcome = state.monitor.run_checks().await;
    let calendar = state.monitor.calendar();
    let timestamp = calendar.format_timestamp(state.monitor.now());
    let timezone = calendar.window().timezone.clone();

    match outcome {
        RunOutcome::Completed { alerts, .. } => Json(CronResponse {
            ok: true,
            alerts: alerts.len(),
            mode,
            schedule: mode.cron_expression(),
            timestamp,
            timezone,
        })
        .into_response(),
        RunOutcome::Failed { error, .. } => {
            internal_error("ok", error, &[("timestamp", timestamp), ("timezone", timezone)])
        }
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Current spend, CPA and business-day snapshot. Sends nothing.
pub async fn status(State(state): State<Arc<AppState>>, Query(q): Query<SecretQuery>) -> Response {
    if !state.authorized(q.secret.as_deref()) {
        return unauthorized("status");
    }

    match state.monitor.status().await {
        Ok(report) => {
            let headline = report.headline(state.monitor.calendar().label());
            info!(spend = %headline.spend, cpa = %headline.cpa, purchases = headline.purchases, "Status fetched");
            Json(json!({ "success": true, "status": report, "summary": headline })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Status check failed");
            internal_error("success", e.to_string(), &[])
        }
    }
}

// ── Schedule toggle ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub mode: ScheduleMode,
    pub schedule: &'static str,
    pub description: &'static str,
    pub message: String,
}

/// Flip the polling cadence between test and production.
///
/// The trigger endpoint is then called once with the new schedule; that
/// call is fire-and-forget and its failure does not undo the toggle.
pub async fn toggle_cron(State(state): State<Arc<AppState>>, Query(q): Query<SecretQuery>) -> Response {
    if !state.authorized(q.secret.as_deref()) {
        return unauthorized("toggle-cron");
    }

    let mode = state.schedule.toggle();
    info!(mode = %mode, description = mode.description(), "Schedule toggled");

    notify_trigger(&state, mode);

    Json(ToggleResponse {
        success: true,
        mode,
        schedule: mode.cron_expression(),
        description: mode.description(),
        message: format!("Cron switched to {mode} mode: {}", mode.description()),
    })
    .into_response()
}

fn notify_trigger(state: &AppState, mode: ScheduleMode) {
    let url = format!("{}/api/cron", state.config.server.public_base_url);
    let request = state.http.get(&url).query(&[
        ("secret", state.config.cron_secret.as_str()),
        ("schedule", mode.cron_expression()),
    ]);

    tokio::spawn(async move {
        match request.send().await {
            Ok(resp) if resp.status().is_success() => info!("Trigger endpoint acknowledged new schedule"),
            Ok(resp) => warn!(status = %resp.status(), "Trigger endpoint rejected schedule update"),
            Err(e) => warn!(error = %e.without_url(), "Could not reach trigger endpoint"),
        }
    });
}
