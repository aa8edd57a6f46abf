#![allow(dead_code)]

use std::sync::Arc;

use etfdash::api::{FundApi, HttpFundApi};
use wiremock::MockServer;

pub const FUNDS_JSON: &str = r#"[
    {
        "id": 1,
        "dateScraped": "2025-01-15T10:00:00Z",
        "ticker": "TMOS",
        "tradeStatus": "Торгуется",
        "managementCo": "Т-Капитал",
        "assetClass": "Акции",
        "terPercent": 0.79,
        "fundName": "Тинькофф Индекс МосБиржи",
        "priceChange6M": 12.5,
        "priceChange2024": -8.1,
        "navMillionRub": 1500.5,
        "lastUpdateDate": "2025-01-15"
    },
    {
        "id": 2,
        "ticker": "SBMM",
        "tradeStatus": "Торгуется",
        "managementCo": "Первая",
        "assetClass": "Денежный рынок",
        "terPercent": 0.3,
        "fundName": "Сбережения",
        "priceChange6M": 9.0,
        "navMillionRub": 900.0
    },
    {
        "id": 3,
        "ticker": "EQMX",
        "tradeStatus": "Приостановлен",
        "managementCo": "ВИМ",
        "assetClass": "Акции",
        "fundName": "Индекс МосБиржи",
        "navMillionRub": null
    }
]"#;

pub const SEARCH_JSON: &str = r#"[
    {
        "ticker": "TMOS",
        "tradeStatus": "Торгуется",
        "managementCo": "Т-Капитал",
        "assetClass": "Акции",
        "terPercent": 0.79,
        "fundName": "Тинькофф Индекс МосБиржи",
        "navMillionRub": 1500.5
    }
]"#;

pub const STATS_JSON: &str = r#"{
    "totalRecords": 420,
    "uniqueTickers": 140,
    "scrapeSessions": 3,
    "totalNAV": 812345.67,
    "avgTER": 0.95,
    "lastUpdate": "2025-01-15T10:00:00Z"
}"#;

pub const ASSET_CLASSES_JSON: &str =
    r#"{"assetClasses": ["Все", "Акции", "Облигации", "Денежный рынок"]}"#;

/// Client pointed at `<mock server>/api`, matching the real backend layout.
pub fn api_for(server: &MockServer) -> Arc<dyn FundApi> {
    Arc::new(HttpFundApi::new().with_base_url(format!("{}/api", server.uri())))
}
