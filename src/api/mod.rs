//! Client for the fund listing REST API.

mod client;
mod error;

pub use client::{HttpFundApi, DEFAULT_BASE_URL};
pub use error::*;

use crate::models::{AssetClassList, FundRecord, ScrapeAck, ServerStats, SortBy, SortOrder};

/// Parameters for `GET /etfs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundQuery {
    pub sort_by: SortBy,
    pub order: SortOrder,
    /// Server-side class filter. `None` and the wildcard class both mean "all".
    pub asset_class: Option<String>,
}

/// Operations the dashboard needs from the backend.
#[async_trait::async_trait]
pub trait FundApi: Send + Sync {
    async fn get_funds(&self, query: &FundQuery) -> Result<Vec<FundRecord>, ApiError>;

    async fn get_fund(&self, ticker: &str) -> Result<FundRecord, ApiError>;

    async fn get_stats(&self) -> Result<ServerStats, ApiError>;

    async fn get_asset_classes(&self) -> Result<AssetClassList, ApiError>;

    async fn top_by_nav(&self, limit: usize) -> Result<Vec<FundRecord>, ApiError>;

    async fn search(&self, query: &str) -> Result<Vec<FundRecord>, ApiError>;

    async fn start_scraping(&self) -> Result<ScrapeAck, ApiError>;
}
