//! `MetaClient` against a local stand-in for the Graph API.

use std::collections::HashMap;
use std::sync::Arc;

use adwatch_core::config::MetaConfig;
use adwatch_meta::{DateRange, MetaClient, MetricsSource, SourceError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::json;

#[derive(Clone, Default)]
struct Behaviour {
    base: String,
    fail_campaigns: bool,
    reject_token: bool,
}

type Shared = State<Arc<Behaviour>>;
type Params = Query<HashMap<String, String>>;

async fn insights(State(b): Shared, Query(q): Params) -> Response {
    let level = q.get("level").map(String::as_str).unwrap_or("");
    let body = match (level, q.get("page").map(String::as_str)) {
        ("adset", None) => json!({
            "data": [
                { "adset_id": "1", "adset_name": "Prospecting", "spend": "40.00",
                  "impressions": "1000", "clicks": "20", "ctr": "2.0", "cpc": "2.0" },
                { "adset_id": "2", "adset_name": "Retargeting", "spend": "25.50",
                  "impressions": "500", "clicks": "15", "ctr": "3.0", "cpc": "1.7" }
            ],
            "paging": { "next": format!("{}/v19.0/act_42/insights?level=adset&page=2", b.base) }
        }),
        ("adset", Some(_)) => json!({
            "data": [
                { "adset_id": "3", "adset_name": "Lookalike", "spend": "10",
                  "impressions": "300", "clicks": "3", "ctr": "1.0", "cpc": "3.3" }
            ]
        }),
        ("campaign", _) => json!({
            "data": [
                { "campaign_id": "c1", "spend": "50.00" },
                { "campaign_id": "c2", "spend": "0.00" }
            ]
        }),
        ("account", _) => json!({
            "data": [{
                "spend": "300.00",
                "actions": [
                    { "action_type": "link_click", "value": "90" },
                    { "action_type": "purchase", "value": "4" }
                ]
            }]
        }),
        _ => json!({ "data": [] }),
    };
    Json(body).into_response()
}

async fn campaigns(State(b): Shared) -> Response {
    if b.fail_campaigns {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "Service temporarily unavailable", "code": 2 } })),
        )
            .into_response();
    }
    Json(json!({
        "data": [
            { "id": "c1", "name": "Paused but spent", "effective_status": "PAUSED", "daily_budget": "10000" },
            { "id": "c2", "name": "Active", "effective_status": "ACTIVE", "daily_budget": "7500" },
            { "id": "c3", "name": "Old", "effective_status": "ARCHIVED", "daily_budget": "99900" }
        ]
    }))
    .into_response()
}

async fn debug_token(State(b): Shared) -> Response {
    if b.reject_token {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": "Invalid OAuth access token.", "type": "OAuthException", "code": 190 } })),
        )
            .into_response();
    }
    Json(json!({
        "data": { "is_valid": true, "expires_at": 1_800_000_000, "app_id": "app-9", "scopes": ["ads_read"] }
    }))
    .into_response()
}

async fn spawn(mut behaviour: Behaviour) -> MetaClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    behaviour.base = base.clone();

    let app = Router::new()
        .route("/v19.0/act_42/insights", get(insights))
        .route("/v19.0/act_42/campaigns", get(campaigns))
        .route("/v19.0/debug_token", get(debug_token))
        .with_state(Arc::new(behaviour));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MetaClient::new(&MetaConfig {
        access_token: "test-token".into(),
        ad_account_id: "act_42".into(),
        api_version: "v19.0".into(),
        graph_url: base,
        default_daily_budget: 200.0,
    })
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

#[tokio::test]
async fn segment_insights_follow_paging() {
    let client = spawn(Behaviour::default()).await;
    let records = client.segment_insights(DateRange::day(today())).await.unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.segment_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(records[1].spend, 25.5);
    assert_eq!(records[0].clicks, 20);
}

#[tokio::test]
async fn budget_sums_active_and_spending_campaigns() {
    let client = spawn(Behaviour::default()).await;
    // c1 spent today (100), c2 is active (75), c3 neither.
    assert_eq!(client.daily_budget(today()).await.unwrap(), 175.0);
}

#[tokio::test]
async fn budget_falls_back_when_lookup_fails() {
    let client = spawn(Behaviour {
        fail_campaigns: true,
        ..Behaviour::default()
    })
    .await;
    assert_eq!(client.daily_budget(today()).await.unwrap(), 200.0);
}

#[tokio::test]
async fn account_spend_and_cpa() {
    let client = spawn(Behaviour::default()).await;
    assert_eq!(client.account_spend(today()).await.unwrap(), 300.0);
    assert_eq!(client.account_cpa(today()).await.unwrap(), 75.0);
}

#[tokio::test]
async fn campaigns_active_reads_effective_status() {
    let client = spawn(Behaviour::default()).await;
    assert!(client.campaigns_active().await.unwrap());
}

#[tokio::test]
async fn token_status_parsed() {
    let client = spawn(Behaviour::default()).await;
    let status = client.token_status().await.unwrap();
    assert!(status.is_valid);
    assert_eq!(status.expires_at, 1_800_000_000);
    assert_eq!(status.app_id.as_deref(), Some("app-9"));
}

#[tokio::test]
async fn graph_error_message_surfaces() {
    let client = spawn(Behaviour {
        reject_token: true,
        ..Behaviour::default()
    })
    .await;
    match client.token_status().await {
        Err(SourceError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid OAuth access token.");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn campaign_errors_propagate_outside_budget() {
    let client = spawn(Behaviour {
        fail_campaigns: true,
        ..Behaviour::default()
    })
    .await;
    assert!(matches!(
        client.campaigns_active().await,
        Err(SourceError::Api { status: 500, .. })
    ));
}
