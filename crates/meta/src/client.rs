//! Meta Graph API client.

use adwatch_core::config::MetaConfig;
use adwatch_core::{MetricsRecord, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::error::SourceError;
use crate::models::{
    CampaignRow, DebugTokenEnvelope, ErrorEnvelope, InsightRow, Page, TokenExchangeResponse,
};
use crate::source::{DateRange, MetricsSource};

const ADSET_FIELDS: &str = "adset_id,adset_name,spend,impressions,clicks,ctr,cpc,actions";
const CAMPAIGN_FIELDS: &str = "id,name,status,effective_status,daily_budget,lifetime_budget";
/// Upper bound on followed `paging.next` links per request.
const MAX_PAGES: usize = 50;

/// A long-lived token returned by [`MetaClient::exchange_token`].
#[derive(Debug, Clone, Serialize)]
pub struct ExchangedToken {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

pub struct MetaClient {
    client: reqwest::Client,
    access_token: String,
    account_id: String,
    base_url: String,
    api_version: String,
    fallback_budget: f64,
}

impl MetaClient {
    pub fn new(config: &MetaConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &MetaConfig) -> Self {
        Self {
            client,
            access_token: config.access_token.clone(),
            account_id: config.ad_account_id.clone(),
            base_url: config.graph_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            fallback_budget: config.default_daily_budget,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, path)
    }

    fn account_url(&self, edge: &str) -> String {
        self.url(&format!("{}/{}", self.account_id, edge))
    }

    /// Send a request and decode the body, mapping non-2xx responses to
    /// [`SourceError::Api`] with the Graph error message when present.
    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, SourceError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))
    }

    /// GET an edge and follow `paging.next` until exhausted.
    async fn get_all<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, SourceError> {
        let first = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query);
        let page: Page<T> = self.send_json(first).await?;
        let mut rows = page.data;
        let mut next = page.paging.and_then(|p| p.next);

        let mut pages = 1;
        while let Some(url) = next {
            if pages >= MAX_PAGES {
                warn!(pages, "Stopped following Graph paging links");
                break;
            }
            let req = self.client.get(&url).bearer_auth(&self.access_token);
            let page: Page<T> = self.send_json(req).await?;
            rows.extend(page.data);
            next = page.paging.and_then(|p| p.next);
            pages += 1;
        }

        Ok(rows)
    }

    async fn insights(&self, level: &str, fields: &str, range: DateRange) -> Result<Vec<InsightRow>, SourceError> {
        let time_range = json!({
            "since": range.since.format("%Y-%m-%d").to_string(),
            "until": range.until.format("%Y-%m-%d").to_string(),
        });
        let mut query = vec![
            ("fields", fields.to_string()),
            ("level", level.to_string()),
            ("time_range", time_range.to_string()),
        ];
        if level == "adset" {
            query.push(("time_increment", "1".to_string()));
        }
        self.get_all(&self.account_url("insights"), &query).await
    }

    async fn campaigns(&self) -> Result<Vec<CampaignRow>, SourceError> {
        let query = [
            ("fields", CAMPAIGN_FIELDS.to_string()),
            ("limit", "500".to_string()),
        ];
        self.get_all(&self.account_url("campaigns"), &query).await
    }

    async fn budget_from_campaigns(&self, today: NaiveDate) -> Result<f64, SourceError> {
        let (campaigns, spend_rows) = tokio::try_join!(
            self.campaigns(),
            self.insights("campaign", "campaign_id,spend", DateRange::day(today)),
        )?;
        let spent_today = aggregate::campaigns_with_spend(&spend_rows);
        debug!(
            campaigns = campaigns.len(),
            spent_today = spent_today.len(),
            "Aggregating campaign budgets"
        );
        Ok(aggregate::daily_budget(&campaigns, &spent_today))
    }

    /// Inspect an arbitrary token through `debug_token`.
    pub async fn debug_token(&self, token: &str) -> Result<TokenStatus, SourceError> {
        let req = self
            .client
            .get(self.url("debug_token"))
            .query(&[("input_token", token), ("access_token", token)]);
        let envelope: DebugTokenEnvelope = self.send_json(req).await?;
        Ok(envelope.data.into())
    }

    /// Trade a short-lived user token for a long-lived one.
    pub async fn exchange_token(&self, short_lived: &str, app_secret: &str) -> Result<ExchangedToken, SourceError> {
        let status = self.debug_token(short_lived).await?;
        let app_id = status
            .app_id
            .ok_or_else(|| SourceError::Parse("debug_token response has no app_id".into()))?;

        let req = self.client.get(self.url("oauth/access_token")).query(&[
            ("grant_type", "fb_exchange_token"),
            ("client_id", app_id.as_str()),
            ("client_secret", app_secret),
            ("fb_exchange_token", short_lived),
        ]);
        let resp: TokenExchangeResponse = self.send_json(req).await?;
        info!(expires_in = ?resp.expires_in, "Exchanged token for long-lived token");

        Ok(ExchangedToken {
            access_token: resp.access_token,
            token_type: resp.token_type,
            expires_in: resp.expires_in,
        })
    }
}

#[async_trait]
impl MetricsSource for MetaClient {
    async fn token_status(&self) -> Result<TokenStatus, SourceError> {
        self.debug_token(&self.access_token).await
    }

    async fn segment_insights(&self, range: DateRange) -> Result<Vec<MetricsRecord>, SourceError> {
        let rows = self.insights("adset", ADSET_FIELDS, range).await?;
        let records: Vec<MetricsRecord> = rows.into_iter().map(InsightRow::into_record).collect();
        info!(
            since = %range.since,
            until = %range.until,
            records = records.len(),
            "Fetched ad set insights"
        );
        Ok(records)
    }

    /// Never fails: any fetch error or a zero total falls back to the
    /// configured default budget.
    async fn daily_budget(&self, today: NaiveDate) -> Result<f64, SourceError> {
        match self.budget_from_campaigns(today).await {
            Ok(total) if total > 0.0 => Ok(total),
            Ok(_) => {
                info!(fallback = self.fallback_budget, "No campaign budget found, using default");
                Ok(self.fallback_budget)
            }
            Err(e) => {
                warn!(error = %e, fallback = self.fallback_budget, "Budget lookup failed, using default");
                Ok(self.fallback_budget)
            }
        }
    }

    async fn account_spend(&self, today: NaiveDate) -> Result<f64, SourceError> {
        let rows = self.insights("account", "spend", DateRange::day(today)).await?;
        Ok(rows.first().map(InsightRow::spend).unwrap_or(0.0))
    }

    async fn account_cpa(&self, today: NaiveDate) -> Result<f64, SourceError> {
        let rows = self
            .insights("account", "spend,actions", DateRange::day(today))
            .await?;
        Ok(aggregate::cost_per_purchase(&rows))
    }

    async fn campaigns_active(&self) -> Result<bool, SourceError> {
        Ok(self.campaigns().await?.iter().any(CampaignRow::is_active))
    }
}
