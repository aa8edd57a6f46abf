use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use etfdash::api::{FundApi, HttpFundApi};
use etfdash::app::{self, ViewOptions};
use etfdash::config::{default_config_path, ResolvedConfig};
use etfdash::models::{SortBy, SortOrder};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "etfdash")]
#[command(about = "Dashboard for Russian exchange-traded funds")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Sort key: nav_million_rub, ter_percent, price_change_2024, ticker
    #[arg(long)]
    sort_by: Option<SortBy>,

    /// Sort order: asc or desc
    #[arg(long)]
    order: Option<SortOrder>,

    /// Only keep funds of this asset class
    #[arg(long)]
    asset_class: Option<String>,

    /// Replace the listing with server-side search results
    #[arg(long)]
    search: Option<String>,
}

impl From<ViewArgs> for ViewOptions {
    fn from(args: ViewArgs) -> Self {
        Self {
            sort_by: args.sort_by,
            order: args.order,
            asset_class: args.asset_class,
            search: args.search,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal dashboard (default)
    Tui,

    /// List funds as JSON
    List {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show one fund by ticker
    Show { ticker: String },

    /// Server-wide statistics
    Stats,

    /// Asset classes available for filtering
    AssetClasses,

    /// Largest funds by net asset value
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Server-side search by ticker, name or management company
    Search { query: String },

    /// Ask the backend to start a scrape session
    Scrape,

    /// Export the filtered listing to CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Directory for the CSV file; defaults to the configured export dir
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Show current configuration
    Config,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();
}

/// The dashboard owns the terminal, so logs go to the configured file or nowhere.
fn init_tui_logging(config: &ResolvedConfig) -> Result<()> {
    let Some(path) = config.log_file.as_ref() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(default_filter())
        .with(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ResolvedConfig::load_or_default(&cli.config)?;

    let command = cli.command.unwrap_or(Command::Tui);
    if matches!(command, Command::Tui) {
        init_tui_logging(&config)?;
    } else {
        init_cli_logging();
    }

    let api: Arc<dyn FundApi> =
        Arc::new(HttpFundApi::new().with_base_url(config.api.base_url.clone()));

    match command {
        Command::Tui => etfdash::tui::run_tui(api, &config).await,
        Command::List { view } => {
            print_json(&app::list_funds(api, &config, &view.into()).await?)
        }
        Command::Show { ticker } => print_json(&app::show_fund(api.as_ref(), &ticker).await?),
        Command::Stats => print_json(&app::stats(api.as_ref()).await?),
        Command::AssetClasses => print_json(&app::asset_classes(api.as_ref()).await?),
        Command::Top { limit } => print_json(&app::top_by_nav(api.as_ref(), limit).await?),
        Command::Search { query } => print_json(&app::search(api.as_ref(), &query).await?),
        Command::Scrape => print_json(&app::scrape(api.as_ref()).await?),
        Command::Export { view, output_dir } => {
            let today = Utc::now().date_naive();
            let output = app::export_funds(
                api,
                &config,
                &view.into(),
                output_dir.as_deref(),
                today,
            )
            .await?;
            print_json(&output)
        }
        Command::Config => print_json(&app::config_output(&cli.config, &config)),
    }
}
