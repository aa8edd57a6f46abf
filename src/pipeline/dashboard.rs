use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

use super::{Outcome, Pipeline, RecordsRequest};
use crate::api::{ApiError, FundApi};
use crate::export::export_to_csv;
use crate::models::{FilterCriteria, FundRecord, SortBy, SortOrder};

/// A [`Pipeline`] wired to an API client.
///
/// Calls are awaited in place, so responses on one dashboard arrive in issue
/// order. Callers that run requests in the background (the TUI search) use
/// [`Dashboard::pipeline_mut`] and the request/apply pair directly.
pub struct Dashboard {
    api: Arc<dyn FundApi>,
    pipeline: Pipeline,
}

impl Dashboard {
    pub fn new(api: Arc<dyn FundApi>, criteria: FilterCriteria) -> Self {
        Self {
            api,
            pipeline: Pipeline::new(criteria),
        }
    }

    pub fn api(&self) -> Arc<dyn FundApi> {
        Arc::clone(&self.api)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// First load: records and asset classes concurrently, then global stats.
    pub async fn initial_load(&mut self) -> Outcome {
        let request = self.pipeline.request_records();
        let api = Arc::clone(&self.api);
        let (records, classes) =
            tokio::join!(api.get_funds(&request.query), api.get_asset_classes());

        self.pipeline.apply_asset_classes(classes);
        let outcome = self.pipeline.apply_records(request.seq, records);
        if outcome == Outcome::Applied {
            self.refresh_stats().await;
        }
        outcome
    }

    /// Refetch records with the current sort, then global stats.
    pub async fn reload(&mut self) -> Outcome {
        let request = self.pipeline.request_records();
        self.run_records(request).await
    }

    async fn run_records(&mut self, request: RecordsRequest) -> Outcome {
        debug!(
            seq = request.seq,
            sort_by = %request.query.sort_by,
            order = %request.query.order,
            "Fetching fund records"
        );
        let result = self.api.get_funds(&request.query).await;
        let outcome = self.pipeline.apply_records(request.seq, result);
        if outcome == Outcome::Applied {
            self.refresh_stats().await;
        }
        outcome
    }

    pub async fn refresh_stats(&mut self) -> Outcome {
        let result = self.api.get_stats().await;
        self.pipeline.apply_stats(result)
    }

    pub async fn refresh_asset_classes(&mut self) -> Outcome {
        let result = self.api.get_asset_classes().await;
        self.pipeline.apply_asset_classes(result)
    }

    /// Change the sort key; refetches when it actually changed.
    pub async fn set_sort_by(&mut self, sort_by: SortBy) -> Option<Outcome> {
        let request = self.pipeline.set_sort_by(sort_by)?;
        Some(self.run_records(request).await)
    }

    pub async fn set_sort_order(&mut self, order: SortOrder) -> Option<Outcome> {
        let request = self.pipeline.set_sort_order(order)?;
        Some(self.run_records(request).await)
    }

    pub async fn toggle_sort_order(&mut self) -> Option<Outcome> {
        let request = self.pipeline.toggle_sort_order()?;
        Some(self.run_records(request).await)
    }

    /// Select an asset class; purely local, no request is made.
    pub fn select_asset_class(&mut self, class: impl Into<String>) -> bool {
        self.pipeline.select_asset_class(class)
    }

    /// Search immediately (no debounce). Blank terms restore the local view.
    pub async fn search(&mut self, term: &str) -> Outcome {
        let Some(request) = self.pipeline.request_search(term) else {
            return Outcome::Applied;
        };
        let result = self.api.search(&request.term).await;
        self.pipeline.apply_search(request, result)
    }

    pub async fn lookup(&self, ticker: &str) -> Result<FundRecord, ApiError> {
        self.api.get_fund(ticker).await
    }

    /// Write the current view as CSV into `dir`.
    pub fn export_view(&self, dir: &Path, prefix: &str, date: NaiveDate) -> Result<PathBuf> {
        export_to_csv(self.pipeline.view(), prefix, dir, date)
    }
}
