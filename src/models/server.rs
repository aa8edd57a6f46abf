use serde::{Deserialize, Serialize};

use super::criteria::ALL_ASSET_CLASSES;

/// Body of `GET /stats`: aggregates the server computes over its full dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerStats {
    pub total_records: u64,
    pub unique_tickers: u64,
    pub scrape_sessions: u64,
    #[serde(rename = "totalNAV")]
    pub total_nav: f64,
    #[serde(rename = "avgTER")]
    pub avg_ter: f64,
    pub last_update: String,
}

/// Body of `GET /asset-classes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetClassList {
    pub asset_classes: Vec<String>,
}

impl AssetClassList {
    /// Filter options, always led by the wildcard entry.
    pub fn into_options(self) -> Vec<String> {
        let mut options: Vec<String> = self
            .asset_classes
            .into_iter()
            .filter(|class| !class.trim().is_empty())
            .collect();
        if options.first().map(String::as_str) != Some(ALL_ASSET_CLASSES) {
            options.retain(|class| class != ALL_ASSET_CLASSES);
            options.insert(0, ALL_ASSET_CLASSES.to_string());
        }
        options
    }
}

/// Acknowledgement returned by `POST /scrape`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeAck {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_tolerate_missing_fields() {
        let stats: ServerStats =
            serde_json::from_str(r#"{"uniqueTickers": 3, "totalNAV": 10.5}"#).unwrap();
        assert_eq!(stats.unique_tickers, 3);
        assert_eq!(stats.total_nav, 10.5);
        assert_eq!(stats.avg_ter, 0.0);
        assert_eq!(stats.last_update, "");
    }

    #[test]
    fn asset_class_options_keep_server_wildcard() {
        let list = AssetClassList {
            asset_classes: vec!["Все".into(), "Акции".into(), "Облигации".into()],
        };
        assert_eq!(list.into_options(), vec!["Все", "Акции", "Облигации"]);
    }

    #[test]
    fn asset_class_options_prepend_missing_wildcard() {
        let list = AssetClassList {
            asset_classes: vec!["Акции".into(), "Все".into()],
        };
        assert_eq!(list.into_options(), vec!["Все", "Акции"]);

        assert_eq!(AssetClassList::default().into_options(), vec!["Все"]);
    }
}
