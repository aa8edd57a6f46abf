use serde::{Deserialize, Serialize};

/// Trade status value the exchange reports for a fund that is open for trading.
pub const TRADING_STATUS: &str = "Торгуется";

/// A single fund listing as served by the API.
///
/// Records are immutable once received. A refetch replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FundRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date_scraped: String,
    pub ticker: String,
    pub trade_status: String,
    pub management_co: String,
    pub asset_class: String,
    pub ter_percent: Option<f64>,
    pub ter_direction: String,
    pub fund_name: String,
    pub management_style: String,
    pub target_index: String,
    pub currency: String,
    pub start_date: String,
    pub info_icon: String,
    #[serde(rename = "priceChange6M")]
    pub price_change_6m: Option<f64>,
    pub price_change_2024: Option<f64>,
    pub price_change_2023: Option<f64>,
    pub price_change_2022: Option<f64>,
    pub price_change_2021: Option<f64>,
    pub price_change_2020: Option<f64>,
    pub nav_million_rub: Option<f64>,
    pub last_update_date: String,
}

impl FundRecord {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    pub fn is_trading(&self) -> bool {
        self.trade_status == TRADING_STATUS
    }

    /// Historical yearly price changes, most recent first.
    pub fn yearly_changes(&self) -> [(u16, Option<f64>); 5] {
        [
            (2024, self.price_change_2024),
            (2023, self.price_change_2023),
            (2022, self.price_change_2022),
            (2021, self.price_change_2021),
            (2020, self.price_change_2020),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_wire_record() {
        let json = r#"{
            "id": 7,
            "ticker": "TMOS",
            "fundName": "Тинькофф Индекс МосБиржи",
            "managementCo": "Т-Капитал",
            "assetClass": "Акции",
            "terPercent": 0.79,
            "navMillionRub": 12345.6,
            "priceChange6M": -4.2,
            "priceChange2024": null,
            "tradeStatus": "Торгуется"
        }"#;
        let record: FundRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(7));
        assert_eq!(record.ticker, "TMOS");
        assert_eq!(record.ter_percent, Some(0.79));
        assert_eq!(record.price_change_6m, Some(-4.2));
        assert_eq!(record.price_change_2024, None);
        assert_eq!(record.currency, "");
        assert!(record.is_trading());
    }

    #[test]
    fn serializes_six_month_change_with_wire_name() {
        let mut record = FundRecord::new("AKME");
        record.price_change_6m = Some(1.5);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["priceChange6M"], 1.5);
        assert!(json.get("id").is_none());
    }
}
