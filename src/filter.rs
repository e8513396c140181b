//! Issue list state driven by user-adjustable filters.
//!
//! Every filter change re-fetches the list. Fetches are neither debounced nor
//! cancelled, so responses may arrive out of order; each fetch is tagged with
//! a monotonically increasing sequence number and only the most recently
//! issued one may update the list.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::errors::GatewayError;
use crate::gateway::Gateway;
use crate::models::{FilterUpdate, Issue, IssueFilter};

pub const LOAD_ISSUES_ERROR: &str = "Failed to load issues. Please try again.";

/// What happened to a single fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response was the latest issued and now backs the list.
    Applied { seq: u64, count: usize },
    /// A newer fetch was issued meanwhile; the response was discarded.
    Superseded { seq: u64, latest: u64 },
    /// The latest fetch failed; the list was cleared.
    Failed { seq: u64, error: GatewayError },
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}

/// Point-in-time copy of the filter state for rendering.
#[derive(Debug, Clone, Default)]
pub struct FilterSnapshot {
    pub filter: IssueFilter,
    pub issues: Vec<Issue>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Default)]
struct FilterInner {
    filter: IssueFilter,
    issues: Vec<Issue>,
    error: Option<String>,
    latest_seq: u64,
    loading: bool,
}

pub struct IssueFilterState {
    gateway: Arc<dyn Gateway>,
    user_id: u64,
    inner: Mutex<FilterInner>,
}

impl IssueFilterState {
    pub fn new(gateway: Arc<dyn Gateway>, user_id: u64) -> Self {
        Self::with_filter(gateway, user_id, IssueFilter::default())
    }

    pub fn with_filter(gateway: Arc<dyn Gateway>, user_id: u64, filter: IssueFilter) -> Self {
        Self {
            gateway,
            user_id,
            inner: Mutex::new(FilterInner {
                filter,
                ..FilterInner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FilterInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Merge `update` into the current filter and re-fetch.
    pub async fn set_filter(&self, update: FilterUpdate) -> FetchOutcome {
        let (seq, filter) = {
            let mut inner = self.lock();
            update.apply_to(&mut inner.filter);
            Self::issue(&mut inner)
        };
        self.fetch(seq, filter).await
    }

    /// Re-fetch with the current filter (manual retry).
    pub async fn refresh(&self) -> FetchOutcome {
        let (seq, filter) = Self::issue(&mut self.lock());
        self.fetch(seq, filter).await
    }

    fn issue(inner: &mut FilterInner) -> (u64, IssueFilter) {
        inner.latest_seq += 1;
        inner.loading = true;
        (inner.latest_seq, inner.filter.clone())
    }

    async fn fetch(&self, seq: u64, filter: IssueFilter) -> FetchOutcome {
        debug!(seq, ?filter, "fetching issues");
        let result = self.gateway.list_issues(self.user_id, &filter).await;

        let mut inner = self.lock();
        if seq != inner.latest_seq {
            debug!(seq, latest = inner.latest_seq, "discarding stale issue response");
            return FetchOutcome::Superseded {
                seq,
                latest: inner.latest_seq,
            };
        }

        inner.loading = false;
        match result {
            Ok(issues) => {
                let count = issues.len();
                inner.issues = issues;
                inner.error = None;
                FetchOutcome::Applied { seq, count }
            }
            Err(error) => {
                warn!(seq, error = %error, "failed to load issues");
                inner.issues.clear();
                inner.error = Some(LOAD_ISSUES_ERROR.to_string());
                FetchOutcome::Failed { seq, error }
            }
        }
    }

    pub fn filter(&self) -> IssueFilter {
        self.lock().filter.clone()
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.lock().issues.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn latest_seq(&self) -> u64 {
        self.lock().latest_seq
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        let inner = self.lock();
        FilterSnapshot {
            filter: inner.filter.clone(),
            issues: inner.issues.clone(),
            error: inner.error.clone(),
            loading: inner.loading,
        }
    }
}
