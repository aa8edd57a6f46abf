mod criteria;
mod fund;
mod server;

pub use criteria::{
    is_wildcard_class, FilterCriteria, SortBy, SortOrder, ALL_ASSET_CLASSES,
};
pub use fund::{FundRecord, TRADING_STATUS};
pub use server::{AssetClassList, ScrapeAck, ServerStats};
