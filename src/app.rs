//! One-shot commands behind the CLI. Each returns a serializable output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::api::FundApi;
use crate::config::ResolvedConfig;
use crate::duration::format_duration;
use crate::models::{FilterCriteria, FundRecord, ScrapeAck, ServerStats, SortBy, SortOrder};
use crate::pipeline::{Dashboard, LoadState, Outcome, ViewSource};
use crate::stats::{DisplayStats, GlobalStats};

/// Criteria for `list` and `export`.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub sort_by: Option<SortBy>,
    pub order: Option<SortOrder>,
    pub asset_class: Option<String>,
    pub search: Option<String>,
}

/// JSON output for a filtered fund listing
#[derive(Serialize)]
pub struct FundListOutput {
    pub sort_by: SortBy,
    pub order: SortOrder,
    pub asset_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub stats: DisplayStats,
    pub global_stats: GlobalStats,
    pub funds: Vec<FundRecord>,
}

/// JSON output for the stats command
#[derive(Serialize)]
pub struct StatsOutput {
    pub server: ServerStats,
    pub display: GlobalStats,
}

/// JSON output for the export command
#[derive(Serialize)]
pub struct ExportOutput {
    pub path: String,
    pub rows: usize,
}

pub fn config_output(config_path: &Path, config: &ResolvedConfig) -> serde_json::Value {
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "api": {
            "base_url": config.api.base_url,
        },
        "dashboard": {
            "sort_by": config.dashboard.sort_by,
            "sort_order": config.dashboard.sort_order,
            "search_debounce": format_duration(config.dashboard.search_debounce),
        },
        "export": {
            "dir": config.export_dir.display().to_string(),
            "filename_prefix": config.export_prefix,
        },
        "logging": {
            "file": config.log_file.as_ref().map(|p| p.display().to_string()),
        }
    })
}

/// Load records the way the dashboard does and apply the requested view.
async fn load_view(
    api: Arc<dyn FundApi>,
    config: &ResolvedConfig,
    options: &ViewOptions,
) -> Result<Dashboard> {
    let defaults = config.dashboard.initial_criteria();
    let criteria = FilterCriteria {
        sort_by: options.sort_by.unwrap_or(defaults.sort_by),
        sort_order: options.order.unwrap_or(defaults.sort_order),
        ..defaults
    };

    let mut dashboard = Dashboard::new(api, criteria);
    dashboard.reload().await;
    if let LoadState::Failed(message) = dashboard.pipeline().load_state() {
        bail!("{message}");
    }

    if let Some(class) = options.asset_class.as_deref() {
        dashboard.select_asset_class(class);
    }
    if let Some(term) = options.search.as_deref() {
        if dashboard.search(term).await == Outcome::Failed {
            bail!("{}", crate::api::SEARCH_FAILED);
        }
    }
    Ok(dashboard)
}

pub async fn list_funds(
    api: Arc<dyn FundApi>,
    config: &ResolvedConfig,
    options: &ViewOptions,
) -> Result<FundListOutput> {
    let dashboard = load_view(api, config, options).await?;
    let pipeline = dashboard.pipeline();
    let criteria = pipeline.criteria();

    Ok(FundListOutput {
        sort_by: criteria.sort_by,
        order: criteria.sort_order,
        asset_class: criteria.selected_asset_class.clone(),
        search: match pipeline.view_source() {
            ViewSource::Search(term) => Some(term.clone()),
            ViewSource::Local => None,
        },
        stats: *pipeline.display_stats(),
        global_stats: pipeline.global_stats().clone(),
        funds: pipeline.view().to_vec(),
    })
}

pub async fn export_funds(
    api: Arc<dyn FundApi>,
    config: &ResolvedConfig,
    options: &ViewOptions,
    output_dir: Option<&Path>,
    date: NaiveDate,
) -> Result<ExportOutput> {
    let dashboard = load_view(api, config, options).await?;
    let dir: PathBuf = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.export_dir.clone());

    let path = dashboard.export_view(&dir, &config.export_prefix, date)?;
    Ok(ExportOutput {
        path: path.display().to_string(),
        rows: dashboard.pipeline().view().len(),
    })
}

pub async fn show_fund(api: &dyn FundApi, ticker: &str) -> Result<FundRecord> {
    api.get_fund(ticker)
        .await
        .with_context(|| format!("Failed to look up {ticker}"))
}

pub async fn stats(api: &dyn FundApi) -> Result<StatsOutput> {
    let server = api.get_stats().await?;
    Ok(StatsOutput {
        display: GlobalStats::from(server.clone()),
        server,
    })
}

pub async fn asset_classes(api: &dyn FundApi) -> Result<Vec<String>> {
    Ok(api.get_asset_classes().await?.into_options())
}

pub async fn top_by_nav(api: &dyn FundApi, limit: usize) -> Result<Vec<FundRecord>> {
    Ok(api.top_by_nav(limit).await?)
}

pub async fn search(api: &dyn FundApi, query: &str) -> Result<Vec<FundRecord>> {
    if query.trim().is_empty() {
        bail!("Search query must not be empty");
    }
    Ok(api.search(query).await?)
}

pub async fn scrape(api: &dyn FundApi) -> Result<ScrapeAck> {
    let ack = api.start_scraping().await?;
    info!(status = %ack.status, message = %ack.message, "Scrape requested");
    Ok(ack)
}
