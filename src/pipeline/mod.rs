//! Dashboard state: fetched records, view criteria, and everything derived from them.
//!
//! [`Pipeline`] is synchronous and does no I/O. Callers ask it for a request
//! (`request_*`), perform the call, and hand the result back (`apply_*`).
//! Every records fetch and every view-changing request carries a sequence
//! number; a response is applied only if it answers the latest request on its
//! channel, so late arrivals can never overwrite fresher state.
//!
//! [`Dashboard`] drives a pipeline against a [`FundApi`](crate::api::FundApi).

mod dashboard;

pub use dashboard::Dashboard;

use tracing::{debug, warn};

use crate::api::{ApiError, FundQuery};
use crate::models::{AssetClassList, FilterCriteria, FundRecord, ServerStats, SortBy, SortOrder};
use crate::models::ALL_ASSET_CLASSES;
use crate::stats::{calculate_stats, DisplayStats, GlobalStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// The last records fetch failed; the message is shown with a retry prompt.
    Failed(String),
}

/// Where the current view came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSource {
    /// Fetched records filtered by the selected asset class.
    Local,
    /// Result of a server search for the given term.
    Search(String),
}

/// What happened to a response handed to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer request on the same channel was issued; the response was dropped.
    Stale,
    /// The call failed; see [`LoadState`] for records, otherwise prior values stay.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordsRequest {
    pub seq: u64,
    pub query: FundQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub term: String,
}

#[derive(Debug)]
pub struct Pipeline {
    criteria: FilterCriteria,
    records: Vec<FundRecord>,
    view: Vec<FundRecord>,
    view_source: ViewSource,
    asset_classes: Vec<String>,
    global_stats: GlobalStats,
    display_stats: DisplayStats,
    load_state: LoadState,
    next_seq: u64,
    latest_records_seq: u64,
    latest_view_seq: u64,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(FilterCriteria::default())
    }
}

impl Pipeline {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            records: Vec::new(),
            view: Vec::new(),
            view_source: ViewSource::Local,
            asset_classes: vec![ALL_ASSET_CLASSES.to_string()],
            global_stats: GlobalStats::default(),
            display_stats: DisplayStats::default(),
            load_state: LoadState::Loading,
            next_seq: 0,
            latest_records_seq: 0,
            latest_view_seq: 0,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Records from the most recent successful fetch, in server order.
    pub fn records(&self) -> &[FundRecord] {
        &self.records
    }

    /// The rows currently on screen.
    pub fn view(&self) -> &[FundRecord] {
        &self.view
    }

    pub fn view_source(&self) -> &ViewSource {
        &self.view_source
    }

    pub fn asset_classes(&self) -> &[String] {
        &self.asset_classes
    }

    pub fn global_stats(&self) -> &GlobalStats {
        &self.global_stats
    }

    pub fn display_stats(&self) -> &DisplayStats {
        &self.display_stats
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn has_requested_records(&self) -> bool {
        self.latest_records_seq != 0
    }

    fn issue(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Start a full records fetch with the current sort criteria.
    pub fn request_records(&mut self) -> RecordsRequest {
        let seq = self.issue();
        self.latest_records_seq = seq;
        self.load_state = LoadState::Loading;
        RecordsRequest {
            seq,
            query: FundQuery {
                sort_by: self.criteria.sort_by,
                order: self.criteria.sort_order,
                asset_class: None,
            },
        }
    }

    /// Apply the response to a records fetch.
    ///
    /// On success the record list is replaced, the search term is cleared and
    /// the local asset-class filter is re-applied.
    pub fn apply_records(
        &mut self,
        seq: u64,
        result: Result<Vec<FundRecord>, ApiError>,
    ) -> Outcome {
        if seq != self.latest_records_seq {
            debug!(seq, latest = self.latest_records_seq, "Dropping stale records response");
            return Outcome::Stale;
        }

        match result {
            Ok(records) => {
                self.records = records;
                self.load_state = LoadState::Ready;
                self.criteria.search_term.clear();
                self.refresh_local_view();
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "Failed to load fund records");
                self.load_state = LoadState::Failed(err.to_string());
                Outcome::Failed
            }
        }
    }

    /// Change the sort key. Returns a refetch request if the key changed and
    /// records have been requested before; otherwise the next load picks it up.
    pub fn set_sort_by(&mut self, sort_by: SortBy) -> Option<RecordsRequest> {
        if self.criteria.sort_by == sort_by {
            return None;
        }
        self.criteria.sort_by = sort_by;
        self.sort_changed()
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> Option<RecordsRequest> {
        if self.criteria.sort_order == order {
            return None;
        }
        self.criteria.sort_order = order;
        self.sort_changed()
    }

    pub fn toggle_sort_order(&mut self) -> Option<RecordsRequest> {
        self.set_sort_order(self.criteria.sort_order.toggle())
    }

    fn sort_changed(&mut self) -> Option<RecordsRequest> {
        if self.has_requested_records() {
            Some(self.request_records())
        } else {
            None
        }
    }

    /// Select an asset class. Clears the search term and filters locally.
    ///
    /// Returns `false` if the class was already selected.
    pub fn select_asset_class(&mut self, class: impl Into<String>) -> bool {
        let class = class.into();
        if self.criteria.selected_asset_class == class {
            return false;
        }
        self.criteria.selected_asset_class = class;
        self.criteria.search_term.clear();
        self.refresh_local_view();
        true
    }

    /// Update the search box text without running a search.
    pub fn set_search_input(&mut self, term: impl Into<String>) {
        self.criteria.search_term = term.into();
    }

    /// Run a search for `term`.
    ///
    /// A blank term re-applies the local filter and returns `None`. Otherwise
    /// the caller must perform the returned server search.
    pub fn request_search(&mut self, term: &str) -> Option<SearchRequest> {
        self.criteria.search_term = term.to_string();
        if term.trim().is_empty() {
            self.refresh_local_view();
            return None;
        }
        let seq = self.issue();
        self.latest_view_seq = seq;
        Some(SearchRequest {
            seq,
            term: term.to_string(),
        })
    }

    pub fn apply_search(
        &mut self,
        request: SearchRequest,
        result: Result<Vec<FundRecord>, ApiError>,
    ) -> Outcome {
        if request.seq != self.latest_view_seq {
            debug!(
                seq = request.seq,
                latest = self.latest_view_seq,
                term = %request.term,
                "Dropping stale search response"
            );
            return Outcome::Stale;
        }

        match result {
            Ok(records) => {
                self.view = records;
                self.view_source = ViewSource::Search(request.term);
                self.display_stats = calculate_stats(&self.view);
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %err, term = %request.term, "Search failed");
                Outcome::Failed
            }
        }
    }

    pub fn apply_stats(&mut self, result: Result<ServerStats, ApiError>) -> Outcome {
        match result {
            Ok(stats) => {
                self.global_stats = GlobalStats::from(stats);
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "Failed to load stats");
                Outcome::Failed
            }
        }
    }

    pub fn apply_asset_classes(&mut self, result: Result<AssetClassList, ApiError>) -> Outcome {
        match result {
            Ok(list) => {
                self.asset_classes = list.into_options();
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "Failed to load asset classes");
                Outcome::Failed
            }
        }
    }

    /// Recompute the view from the fetched records and the selected class.
    ///
    /// Advances the view sequence so in-flight searches are discarded.
    fn refresh_local_view(&mut self) {
        self.latest_view_seq = self.issue();
        self.view = if self.criteria.is_all_asset_classes() {
            self.records.clone()
        } else {
            let class = self.criteria.selected_asset_class.as_str();
            self.records
                .iter()
                .filter(|r| r.asset_class == class)
                .cloned()
                .collect()
        };
        self.view_source = ViewSource::Local;
        self.display_stats = calculate_stats(&self.view);
    }
}
