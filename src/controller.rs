use std::collections::HashSet;

use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::filter::FilterState;
use crate::types::{Identified, ListStatus, Page};

/// Failure recorded against the fingerprint that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListError {
    pub fingerprint: String,
    pub page: u32,
    pub message: String,
}

/// Everything the view needs to render the list.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub has_more: bool,
    pub status: ListStatus,
    pub last_error: Option<ListError>,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            has_more: true,
            status: ListStatus::Idle,
            last_error: None,
        }
    }
}

/// A page load the caller must run. Carries the fingerprint and generation
/// it was issued under so its outcome can be validated on return.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub fingerprint: String,
    pub filter: FilterState,
    pub page: u32,
    pub page_size: u32,
    pub generation: u64,
}

impl FetchRequest {
    pub async fn run<T>(self, fetcher: &dyn PageFetcher<T>) -> FetchOutcome<T> {
        let result = fetcher.fetch(&self.filter, self.page, self.page_size).await;
        FetchOutcome {
            fingerprint: self.fingerprint,
            page: self.page,
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub fingerprint: String,
    pub page: u32,
    pub generation: u64,
    pub result: Result<Page<T>>,
}

/// What `apply` did with an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// Issued under a filter that is no longer current; dropped untouched.
    Stale,
    Failed,
}

/// Owns the paginated, deduplicated item list for the current filter.
///
/// The controller never performs I/O. Operations that need a page return a
/// `FetchRequest`; the caller runs it (concurrently with anything else) and
/// hands the `FetchOutcome` back to `apply`. Only outcomes issued under the
/// current fingerprint and generation are applied, so overlapping requests
/// can complete in any order.
#[derive(Debug)]
pub struct ListController<T> {
    filter: FilterState,
    fingerprint: String,
    generation: u64,
    page_size: u32,
    snapshot: ListSnapshot<T>,
    seen: HashSet<String>,
    in_flight: Option<u32>,
    failed_page: Option<u32>,
}

impl<T: Identified> ListController<T> {
    pub fn new(filter: FilterState, page_size: u32) -> Self {
        let fingerprint = filter.serialize();
        Self {
            filter,
            fingerprint,
            generation: 0,
            page_size: page_size.max(1),
            snapshot: ListSnapshot::default(),
            seen: HashSet::new(),
            in_flight: None,
            failed_page: None,
        }
    }

    pub fn snapshot(&self) -> &ListSnapshot<T> {
        &self.snapshot
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Bumped on every reset to page one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Initial load for the filter the controller was created with.
    pub fn start(&mut self) -> FetchRequest {
        let filter = self.filter.clone();
        self.reset(filter)
    }

    pub fn on_filter_changed(&mut self, filter: FilterState) -> Option<FetchRequest> {
        if filter.serialize() == self.fingerprint {
            return match self.snapshot.status {
                ListStatus::Error => self.retry(),
                ListStatus::Idle => Some(self.start()),
                ListStatus::Loading | ListStatus::Ready => None,
            };
        }
        Some(self.reset(filter))
    }

    /// Next page, or a retry of the failed one. Ignored before `start()`.
    pub fn on_load_more_requested(&mut self) -> Option<FetchRequest> {
        match self.snapshot.status {
            ListStatus::Loading | ListStatus::Idle => None,
            ListStatus::Error => self.retry(),
            ListStatus::Ready if !self.snapshot.has_more => None,
            ListStatus::Ready => {
                let next = self.snapshot.current_page + 1;
                Some(self.issue(next))
            }
        }
    }

    /// Re-issue the page that failed. Only meaningful in `Error`.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        if self.snapshot.status != ListStatus::Error {
            return None;
        }
        let page = self.failed_page.unwrap_or(1);
        self.snapshot.last_error = None;
        Some(self.issue(page))
    }

    pub fn apply(&mut self, outcome: FetchOutcome<T>) -> Applied {
        if outcome.fingerprint != self.fingerprint
            || outcome.generation != self.generation
            || self.in_flight != Some(outcome.page)
        {
            tracing::debug!(
                fingerprint = %outcome.fingerprint,
                page = outcome.page,
                current = %self.fingerprint,
                "dropping stale page"
            );
            return Applied::Stale;
        }
        self.in_flight = None;

        match outcome.result {
            Ok(page) => {
                if outcome.page == 1 {
                    self.snapshot.items.clear();
                    self.seen.clear();
                }
                let requested = page.requested_page;
                let fetched = page.items.len();
                for item in page.items {
                    if self.seen.insert(item.id().to_string()) {
                        self.snapshot.items.push(item);
                    }
                }
                self.snapshot.current_page = outcome.page;
                self.snapshot.has_more = !page.is_last;
                self.snapshot.status = ListStatus::Ready;
                self.snapshot.last_error = None;
                self.failed_page = None;
                tracing::debug!(
                    page = requested,
                    fetched,
                    total = self.snapshot.items.len(),
                    has_more = self.snapshot.has_more,
                    "page applied"
                );
                Applied::Applied
            }
            Err(e) => {
                tracing::warn!(page = outcome.page, fingerprint = %outcome.fingerprint, "page load failed: {}", e);
                self.snapshot.status = ListStatus::Error;
                self.snapshot.last_error = Some(ListError {
                    fingerprint: outcome.fingerprint,
                    page: outcome.page,
                    message: e.to_string(),
                });
                self.failed_page = Some(outcome.page);
                Applied::Failed
            }
        }
    }

    fn reset(&mut self, filter: FilterState) -> FetchRequest {
        self.fingerprint = filter.serialize();
        self.filter = filter;
        self.generation += 1;
        self.snapshot.items.clear();
        self.seen.clear();
        self.snapshot.current_page = 1;
        self.snapshot.has_more = true;
        self.snapshot.last_error = None;
        self.failed_page = None;
        tracing::debug!(fingerprint = %self.fingerprint, generation = self.generation, "filter changed");
        self.issue(1)
    }

    fn issue(&mut self, page: u32) -> FetchRequest {
        self.snapshot.status = ListStatus::Loading;
        self.in_flight = Some(page);
        FetchRequest {
            fingerprint: self.fingerprint.clone(),
            filter: self.filter.clone(),
            page,
            page_size: self.page_size,
            generation: self.generation,
        }
    }
}
