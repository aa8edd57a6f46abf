//! CSV export of the visible fund table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::models::FundRecord;

/// UTF-8 byte-order mark; spreadsheet tools need it to detect Cyrillic text.
pub const BOM: char = '\u{feff}';

pub const DEFAULT_FILENAME_PREFIX: &str = "etf_data";

const HEADERS: [&str; 8] = [
    "Тикер",
    "Название",
    "УК",
    "Класс активов",
    "TER %",
    "СЧА млн ₽",
    "Изм. 6М %",
    "Изм. 2024 %",
];

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn number_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record_row(record: &FundRecord) -> String {
    [
        record.ticker.clone(),
        quoted(&record.fund_name),
        quoted(&record.management_co),
        quoted(&record.asset_class),
        number_cell(record.ter_percent),
        number_cell(record.nav_million_rub),
        number_cell(record.price_change_6m),
        number_cell(record.price_change_2024),
    ]
    .join(",")
}

/// Render records as a BOM-prefixed CSV document with a header row.
///
/// Only the three free-text columns are quoted. Rows are separated by `\n`
/// with no trailing newline.
pub fn csv_document(records: &[FundRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(HEADERS.join(","));
    lines.extend(records.iter().map(record_row));

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&lines.join("\n"));
    out
}

/// `<prefix>_<YYYY-MM-DD>.csv`
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the CSV document into `dir`, creating it if needed. Returns the file path.
pub fn export_to_csv(
    records: &[FundRecord],
    prefix: &str,
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let path = dir.join(export_filename(prefix, date));
    std::fs::write(&path, csv_document(records))
        .with_context(|| format!("Failed to write CSV export: {}", path.display()))?;

    info!(path = %path.display(), rows = records.len(), "Exported CSV");
    Ok(path)
}
