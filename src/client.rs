//! HTTP client for the warning-letter statistics backend.

use crate::models::{CfrCount, Letter, LineageRecord, OfficeCount, TopCfrTrend};
use crate::query::QueryParams;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint URL {url}: {reason}")]
    Url { url: String, reason: String },
}

/// The five read-only resources behind the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    TopCfr,
    IssuingOffices,
    Letters,
    Lineage,
    TopCfrTrend,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::TopCfr,
        Endpoint::IssuingOffices,
        Endpoint::Letters,
        Endpoint::Lineage,
        Endpoint::TopCfrTrend,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::TopCfr => "/top-cfr",
            Endpoint::IssuingOffices => "/issuing-offices",
            Endpoint::Letters => "/letters",
            Endpoint::Lineage => "/lineage",
            Endpoint::TopCfrTrend => "/top-cfr-trend",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Read operations the dashboard needs from its backend.
pub trait DashboardApi: Send + Sync {
    fn top_cfr(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Vec<CfrCount>, ApiError>> + Send;

    fn issuing_offices(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Vec<OfficeCount>, ApiError>> + Send;

    fn letters(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Vec<Letter>, ApiError>> + Send;

    fn lineage(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Vec<LineageRecord>, ApiError>> + Send;

    fn top_cfr_trend(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<TopCfrTrend, ApiError>> + Send;
}

/// Plain GET client. No timeout, no retries: whatever the network layer does
/// is what the caller gets.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` should look like `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `endpoint`, with `params` URL-encoded in order.
    pub fn endpoint_url(
        &self,
        endpoint: Endpoint,
        params: &QueryParams,
    ) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, endpoint.path());
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params.iter())
        };
        url.map_err(|err| ApiError::Url {
            url: raw,
            reason: err.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &QueryParams,
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint, params)?;

        info!(url = %url, "fetching from backend");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl DashboardApi for ApiClient {
    async fn top_cfr(&self, params: &QueryParams) -> Result<Vec<CfrCount>, ApiError> {
        self.get_json(Endpoint::TopCfr, params).await
    }

    async fn issuing_offices(&self, params: &QueryParams) -> Result<Vec<OfficeCount>, ApiError> {
        self.get_json(Endpoint::IssuingOffices, params).await
    }

    async fn letters(&self, params: &QueryParams) -> Result<Vec<Letter>, ApiError> {
        self.get_json(Endpoint::Letters, params).await
    }

    async fn lineage(&self, params: &QueryParams) -> Result<Vec<LineageRecord>, ApiError> {
        self.get_json(Endpoint::Lineage, params).await
    }

    async fn top_cfr_trend(&self, params: &QueryParams) -> Result<TopCfrTrend, ApiError> {
        self.get_json(Endpoint::TopCfrTrend, params).await
    }
}
