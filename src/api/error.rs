use reqwest::StatusCode;

pub const LOAD_FUNDS_FAILED: &str = "Ошибка загрузки данных ETF";
pub const FUND_NOT_FOUND: &str = "ETF не найден";
pub const LOAD_STATS_FAILED: &str = "Ошибка загрузки статистики";
pub const LOAD_ASSET_CLASSES_FAILED: &str = "Ошибка загрузки классов активов";
pub const LOAD_TOP_FAILED: &str = "Ошибка загрузки топ ETF";
pub const SEARCH_FAILED: &str = "Ошибка поиска";
pub const SCRAPE_FAILED: &str = "Ошибка запуска скрейпинга";

/// Failure of a single API call.
///
/// The display text is the fixed user-facing message for the operation; the
/// status and underlying transport error are kept for logging.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("ETF не найден")]
    NotFound { ticker: String },

    #[error("{message}")]
    Request {
        message: &'static str,
        status: Option<StatusCode>,
        #[source]
        source: Option<reqwest::Error>,
    },
}

impl ApiError {
    pub(crate) fn status(message: &'static str, status: StatusCode) -> Self {
        Self::Request {
            message,
            status: Some(status),
            source: None,
        }
    }

    pub(crate) fn transport(message: &'static str, source: reqwest::Error) -> Self {
        Self::Request {
            message,
            status: source.status(),
            source: Some(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn http_status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Request { status, .. } => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_fixed_message() {
        let err = ApiError::status(LOAD_STATS_FAILED, StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Ошибка загрузки статистики");
        assert_eq!(err.http_status(), Some(StatusCode::BAD_GATEWAY));
        assert!(!err.is_not_found());

        let err = ApiError::NotFound {
            ticker: "NOPE".to_string(),
        };
        assert_eq!(err.to_string(), FUND_NOT_FOUND);
        assert_eq!(err.http_status(), Some(StatusCode::NOT_FOUND));
    }
}
