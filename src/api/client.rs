use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::*;
use super::{FundApi, FundQuery};
use crate::models::{
    is_wildcard_class, AssetClassList, FundRecord, ScrapeAck, ServerStats,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// [`FundApi`] over HTTP.
///
/// No retries, timeouts or caching: every call maps straight to one request.
#[derive(Debug, Clone)]
pub struct HttpFundApi {
    client: Client,
    base_url: String,
}

impl HttpFundApi {
    /// Creates a client for [`DEFAULT_BASE_URL`] with a default HTTP client.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Creates a client with a custom HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at another API root, e.g. `http://host:8080/api`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        message: &'static str,
    ) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(message, e))?;
        debug!(url = %response.url(), status = %response.status(), "API response");
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        message: &'static str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(message, status));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::transport(message, e))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        message: &'static str,
    ) -> Result<T, ApiError> {
        let response = self.send(request, message).await?;
        Self::decode(response, message).await
    }

    /// List endpoints may answer `null` for an empty result.
    async fn fetch_list(
        &self,
        request: RequestBuilder,
        message: &'static str,
    ) -> Result<Vec<FundRecord>, ApiError> {
        let records: Option<Vec<FundRecord>> = self.fetch(request, message).await?;
        Ok(records.unwrap_or_default())
    }
}

impl Default for HttpFundApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FundApi for HttpFundApi {
    async fn get_funds(&self, query: &FundQuery) -> Result<Vec<FundRecord>, ApiError> {
        let mut params = vec![
            ("sortBy", query.sort_by.as_str().to_string()),
            ("order", query.order.as_query().to_string()),
        ];
        if let Some(class) = query
            .asset_class
            .as_deref()
            .filter(|class| !is_wildcard_class(class))
        {
            params.push(("assetClass", class.to_string()));
        }

        let request = self.client.get(self.url("etfs")).query(&params);
        self.fetch_list(request, LOAD_FUNDS_FAILED).await
    }

    async fn get_fund(&self, ticker: &str) -> Result<FundRecord, ApiError> {
        let path = format!("etfs/{}", urlencoding::encode(ticker));
        let response = self
            .send(self.client.get(self.url(&path)), LOAD_FUNDS_FAILED)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        Self::decode(response, LOAD_FUNDS_FAILED).await
    }

    async fn get_stats(&self) -> Result<ServerStats, ApiError> {
        self.fetch(self.client.get(self.url("stats")), LOAD_STATS_FAILED)
            .await
    }

    async fn get_asset_classes(&self) -> Result<AssetClassList, ApiError> {
        self.fetch(
            self.client.get(self.url("asset-classes")),
            LOAD_ASSET_CLASSES_FAILED,
        )
        .await
    }

    async fn top_by_nav(&self, limit: usize) -> Result<Vec<FundRecord>, ApiError> {
        let request = self
            .client
            .get(self.url("top-by-nav"))
            .query(&[("limit", limit)]);
        self.fetch_list(request, LOAD_TOP_FAILED).await
    }

    async fn search(&self, query: &str) -> Result<Vec<FundRecord>, ApiError> {
        let request = self.client.get(self.url("search")).query(&[("q", query)]);
        self.fetch_list(request, SEARCH_FAILED).await
    }

    async fn start_scraping(&self) -> Result<ScrapeAck, ApiError> {
        self.fetch(self.client.post(self.url("scrape")), SCRAPE_FAILED)
            .await
    }
}
