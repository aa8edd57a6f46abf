use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Asset-class value that disables class filtering.
pub const ALL_ASSET_CLASSES: &str = "Все";

/// Server-side sort key for the fund listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    NavMillionRub,
    TerPercent,
    #[serde(rename = "price_change_2024")]
    PriceChange2024,
    Ticker,
}

impl SortBy {
    pub const ALL: [Self; 4] = [
        Self::NavMillionRub,
        Self::TerPercent,
        Self::PriceChange2024,
        Self::Ticker,
    ];

    /// Column name the API expects in `sortBy`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NavMillionRub => "nav_million_rub",
            Self::TerPercent => "ter_percent",
            Self::PriceChange2024 => "price_change_2024",
            Self::Ticker => "ticker",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NavMillionRub => "СЧА",
            Self::TerPercent => "TER",
            Self::PriceChange2024 => "Изм. 2024",
            Self::Ticker => "Тикер",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown sort key {s:?} (expected one of: nav_million_rub, ter_percent, price_change_2024, ticker)"
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Value the API expects in `order`.
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order {other:?} (expected asc or desc)")),
        }
    }
}

/// User-controlled view criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_term: String,
    pub selected_asset_class: String,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            selected_asset_class: ALL_ASSET_CLASSES.to_string(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl FilterCriteria {
    pub fn is_all_asset_classes(&self) -> bool {
        is_wildcard_class(&self.selected_asset_class)
    }
}

pub fn is_wildcard_class(class: &str) -> bool {
    class.is_empty() || class == ALL_ASSET_CLASSES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_round_trips_through_query_names() {
        for key in SortBy::ALL {
            assert_eq!(key.as_str().parse::<SortBy>().unwrap(), key);
        }
        assert!("volume".parse::<SortBy>().is_err());
    }

    #[test]
    fn sort_by_deserializes_from_query_names() {
        let key: SortBy = serde_json::from_str("\"price_change_2024\"").unwrap();
        assert_eq!(key, SortBy::PriceChange2024);
    }

    #[test]
    fn sort_by_cycles_through_all_keys() {
        assert_eq!(SortBy::NavMillionRub.next(), SortBy::TerPercent);
        assert_eq!(SortBy::Ticker.next(), SortBy::NavMillionRub);
    }

    #[test]
    fn sort_order_uses_uppercase_query_value() {
        assert_eq!(SortOrder::Asc.as_query(), "ASC");
        assert_eq!(SortOrder::Desc.toggle(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }

    #[test]
    fn default_criteria_match_initial_dashboard_state() {
        let criteria = FilterCriteria::default();
        assert_eq!(criteria.search_term, "");
        assert!(criteria.is_all_asset_classes());
        assert_eq!(criteria.sort_by, SortBy::NavMillionRub);
        assert_eq!(criteria.sort_order, SortOrder::Desc);
    }
}
