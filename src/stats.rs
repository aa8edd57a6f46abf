//! Aggregate statistics shown in the dashboard's summary cards.

use serde::Serialize;

use crate::format::format_date;
use crate::models::{FundRecord, ServerStats};

/// Aggregates over whatever record list is currently on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DisplayStats {
    pub total_funds: usize,
    pub total_nav: f64,
    pub avg_ter: f64,
}

/// Aggregates the server reports for its full dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_funds: u64,
    pub total_nav: f64,
    pub avg_ter: f64,
    pub last_update: String,
}

impl From<ServerStats> for GlobalStats {
    fn from(stats: ServerStats) -> Self {
        let last_update = Some(stats.last_update.as_str()).filter(|s| !s.is_empty());
        Self {
            total_funds: stats.unique_tickers,
            total_nav: finite_or_zero(stats.total_nav),
            avg_ter: finite_or_zero(stats.avg_ter),
            last_update: format_date(last_update),
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Compute [`DisplayStats`] for a record list.
///
/// Absent NAV counts as zero. Average TER only considers records that report a
/// TER and is zero when none do.
pub fn calculate_stats(records: &[FundRecord]) -> DisplayStats {
    let total_nav = records
        .iter()
        .map(|r| r.nav_million_rub.unwrap_or(0.0))
        .sum();

    let (ter_sum, ter_count) = records
        .iter()
        .filter_map(|r| r.ter_percent)
        .fold((0.0, 0usize), |(sum, n), ter| (sum + ter, n + 1));

    DisplayStats {
        total_funds: records.len(),
        total_nav,
        avg_ter: if ter_count > 0 {
            ter_sum / ter_count as f64
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticker: &str, nav: Option<f64>, ter: Option<f64>) -> FundRecord {
        FundRecord {
            nav_million_rub: nav,
            ter_percent: ter,
            ..FundRecord::new(ticker)
        }
    }

    #[test]
    fn empty_list_has_zero_stats() {
        let stats = calculate_stats(&[]);
        assert_eq!(stats.total_funds, 0);
        assert_eq!(stats.total_nav, 0.0);
        assert_eq!(stats.avg_ter, 0.0);
    }

    #[test]
    fn absent_nav_counts_as_zero() {
        let records = vec![
            record("A", Some(100.0), None),
            record("B", None, None),
            record("C", Some(25.5), None),
        ];
        let stats = calculate_stats(&records);
        assert_eq!(stats.total_funds, 3);
        assert!((stats.total_nav - 125.5).abs() < 1e-9);
        assert_eq!(stats.avg_ter, 0.0);
    }

    #[test]
    fn average_ter_ignores_absent_values() {
        let records = vec![
            record("A", None, Some(1.0)),
            record("B", None, None),
            record("C", None, Some(0.5)),
        ];
        let stats = calculate_stats(&records);
        assert!((stats.avg_ter - 0.75).abs() < 1e-9);
    }

    #[test]
    fn zero_ter_is_still_counted() {
        let records = vec![record("A", None, Some(0.0)), record("B", None, Some(1.0))];
        assert!((calculate_stats(&records).avg_ter - 0.5).abs() < 1e-9);
    }

    #[test]
    fn global_stats_use_unique_tickers_and_format_date() {
        let stats = GlobalStats::from(ServerStats {
            total_records: 400,
            unique_tickers: 120,
            scrape_sessions: 4,
            total_nav: 5000.0,
            avg_ter: 0.9,
            last_update: "2025-10-01".to_string(),
        });
        assert_eq!(stats.total_funds, 120);
        assert_eq!(stats.last_update, "01.10.2025");

        let empty = GlobalStats::from(ServerStats::default());
        assert_eq!(empty.last_update, "Нет данных");
    }
}
