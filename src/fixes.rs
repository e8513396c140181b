//! Fix lifecycle for the issue currently on screen.
//!
//! ```text
//! Generating ─▶ Pending ─▶ Approved | Rejected
//!                  │            │
//!                  └────┬───────┘
//!                       ▼
//!                  Submitting ─▶ Submitted
//!
//! any non-Submitted state ─▶ Deleted (removed from the list)
//! ```
//!
//! The controller owns the in-memory fix list of one issue only. The list is
//! always replaceable by `refresh()`; the only fix the server might not have
//! reported yet is one just returned by `generate()`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::errors::{FixError, GatewayError};
use crate::gateway::Gateway;
use crate::models::{Fix, FixStatus, Issue};

pub const LOAD_DETAIL_ERROR: &str = "Failed to load issue details. Please try again.";

/// Where a listed fix is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixPhase {
    Pending,
    Approved,
    Rejected,
    Submitting,
    Deleting,
    Submitted,
}

impl FixPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Submitting => "submitting",
            Self::Deleting => "deleting",
            Self::Submitted => "submitted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixOperation {
    Submit,
    Delete,
}

/// A listed fix plus its client-side in-flight marker.
#[derive(Debug, Clone, PartialEq)]
pub struct FixEntry {
    pub fix: Fix,
    in_flight: Option<FixOperation>,
}

impl FixEntry {
    fn new(fix: Fix) -> Self {
        Self {
            fix,
            in_flight: None,
        }
    }

    pub fn phase(&self) -> FixPhase {
        if self.fix.was_submitted() {
            return FixPhase::Submitted;
        }
        match self.in_flight {
            Some(FixOperation::Submit) => FixPhase::Submitting,
            Some(FixOperation::Delete) => FixPhase::Deleting,
            None => match self.fix.status {
                FixStatus::Pending => FixPhase::Pending,
                FixStatus::Approved => FixPhase::Approved,
                FixStatus::Rejected => FixPhase::Rejected,
                FixStatus::Submitted => FixPhase::Submitted,
                // Unrecognized review states are still awaiting review
                FixStatus::Other(_) => FixPhase::Pending,
            },
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Submitted fixes can no longer be deleted.
    pub fn is_deletable(&self) -> bool {
        !self.fix.was_submitted() && !self.is_busy()
    }
}

impl From<Fix> for FixEntry {
    fn from(fix: Fix) -> Self {
        Self::new(fix)
    }
}

#[derive(Default)]
struct ControllerInner {
    issue: Option<Issue>,
    fixes: Vec<FixEntry>,
    generating: bool,
    busy: HashSet<u64>,
    error: Option<String>,
}

impl ControllerInner {
    fn position(&self, fix_id: u64) -> Option<usize> {
        self.fixes.iter().position(|e| e.fix.id == fix_id)
    }

    fn set_in_flight(&mut self, fix_id: u64, op: Option<FixOperation>) {
        if let Some(idx) = self.position(fix_id) {
            self.fixes[idx].in_flight = op;
        }
    }
}

/// Clears the generating flag when a generation ends, however it ends.
struct GenerationGuard<'a> {
    inner: &'a Mutex<ControllerInner>,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        lock(self.inner).generating = false;
    }
}

/// Releases a fix id when its submit/delete ends, however it ends.
struct FixGuard<'a> {
    inner: &'a Mutex<ControllerInner>,
    fix_id: u64,
}

impl Drop for FixGuard<'_> {
    fn drop(&mut self) {
        let mut inner = lock(self.inner);
        inner.busy.remove(&self.fix_id);
        inner.set_in_flight(self.fix_id, None);
    }
}

fn lock(inner: &Mutex<ControllerInner>) -> MutexGuard<'_, ControllerInner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct FixLifecycleController {
    gateway: Arc<dyn Gateway>,
    user_id: u64,
    issue_id: u64,
    inner: Mutex<ControllerInner>,
}

impl FixLifecycleController {
    pub fn new(gateway: Arc<dyn Gateway>, user_id: u64, issue_id: u64) -> Self {
        Self {
            gateway,
            user_id,
            issue_id,
            inner: Mutex::new(ControllerInner::default()),
        }
    }

    pub fn issue_id(&self) -> u64 {
        self.issue_id
    }

    /// Load the issue, then its fixes.
    ///
    /// If either request fails the detail view holds no data at all.
    pub async fn open(&self) -> Result<(), GatewayError> {
        let loaded = async {
            let issue = self.gateway.get_issue(self.user_id, self.issue_id).await?;
            let fixes = self.gateway.list_fixes(self.user_id, self.issue_id).await?;
            Ok::<_, GatewayError>((issue, fixes))
        }
        .await;

        let mut inner = lock(&self.inner);
        match loaded {
            Ok((issue, fixes)) => {
                info!(issue_id = self.issue_id, fixes = fixes.len(), "issue detail loaded");
                inner.issue = Some(issue);
                inner.fixes = fixes.into_iter().map(FixEntry::new).collect();
                inner.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(issue_id = self.issue_id, error = %e, "failed to load issue detail");
                inner.issue = None;
                inner.fixes.clear();
                inner.error = Some(LOAD_DETAIL_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Replace the fix list with the server's.
    pub async fn refresh(&self) -> Result<(), GatewayError> {
        match self.gateway.list_fixes(self.user_id, self.issue_id).await {
            Ok(fixes) => {
                let mut inner = lock(&self.inner);
                let refreshed: Vec<FixEntry> = fixes
                    .into_iter()
                    .map(|fix| {
                        // Keep the in-flight marker of fixes still being worked on.
                        let in_flight = inner
                            .fixes
                            .iter()
                            .find(|e| e.fix.id == fix.id)
                            .and_then(|e| e.in_flight);
                        FixEntry { fix, in_flight }
                    })
                    .collect();
                inner.fixes = refreshed;
                Ok(())
            }
            Err(e) => {
                warn!(issue_id = self.issue_id, error = %e, "failed to refresh fixes");
                lock(&self.inner).error = Some(format!("Failed to refresh fixes: {}", e));
                Err(e)
            }
        }
    }

    /// Ask the server for a new fix and append it.
    ///
    /// Only one generation may be in flight for the issue.
    pub async fn generate(&self) -> Result<Fix, FixError> {
        {
            let mut inner = lock(&self.inner);
            if let Some(issue) = &inner.issue
                && !issue.is_ai_fixable
            {
                return Err(FixError::NotAiFixable {
                    issue_id: self.issue_id,
                });
            }
            if inner.generating {
                return Err(FixError::GenerationInFlight {
                    issue_id: self.issue_id,
                });
            }
            inner.generating = true;
        }
        let _guard = GenerationGuard { inner: &self.inner };

        info!(issue_id = self.issue_id, "generating fix");
        match self.gateway.generate_fix(self.user_id, self.issue_id).await {
            Ok(fix) => {
                let mut inner = lock(&self.inner);
                inner.fixes.push(FixEntry::new(fix.clone()));
                inner.error = None;
                Ok(fix)
            }
            Err(e) => Err(self.surface("generate fix", e)),
        }
    }

    /// Submit a fix as a pull request and replace it with the server's copy.
    pub async fn submit(&self, fix_id: u64, message: &str) -> Result<Fix, FixError> {
        let _guard = self.begin(fix_id, FixOperation::Submit)?;

        info!(fix_id, "submitting fix");
        match self.gateway.submit_fix(self.user_id, fix_id, message).await {
            Ok(fix) => {
                let mut inner = lock(&self.inner);
                match inner.position(fix_id) {
                    Some(idx) => inner.fixes[idx].fix = fix.clone(),
                    None => inner.fixes.push(FixEntry::new(fix.clone())),
                }
                inner.error = None;
                Ok(fix)
            }
            Err(e) => Err(self.surface("submit fix", e)),
        }
    }

    /// Delete a non-submitted fix and drop it from the list.
    pub async fn delete(&self, fix_id: u64) -> Result<(), FixError> {
        let _guard = self.begin(fix_id, FixOperation::Delete)?;

        info!(fix_id, "deleting fix");
        match self.gateway.delete_fix(self.user_id, fix_id).await {
            Ok(()) => {
                let mut inner = lock(&self.inner);
                inner.fixes.retain(|e| e.fix.id != fix_id);
                inner.error = None;
                Ok(())
            }
            Err(e) => Err(self.surface("delete fix", e)),
        }
    }

    /// Check the fix can take `op` and mark it in flight.
    fn begin(&self, fix_id: u64, op: FixOperation) -> Result<FixGuard<'_>, FixError> {
        let mut inner = lock(&self.inner);
        let idx = inner.position(fix_id).ok_or(FixError::UnknownFix {
            issue_id: self.issue_id,
            fix_id,
        })?;
        if inner.busy.contains(&fix_id) {
            return Err(FixError::FixBusy { fix_id });
        }
        if inner.fixes[idx].fix.was_submitted() {
            return Err(FixError::AlreadySubmitted { fix_id });
        }
        inner.busy.insert(fix_id);
        inner.fixes[idx].in_flight = Some(op);
        Ok(FixGuard {
            inner: &self.inner,
            fix_id,
        })
    }

    fn surface(&self, action: &str, e: GatewayError) -> FixError {
        warn!(issue_id = self.issue_id, error = %e, "failed to {}", action);
        lock(&self.inner).error = Some(format!("Failed to {}: {}", action, e));
        FixError::Gateway(e)
    }

    pub fn issue(&self) -> Option<Issue> {
        lock(&self.inner).issue.clone()
    }

    pub fn fixes(&self) -> Vec<FixEntry> {
        lock(&self.inner).fixes.clone()
    }

    pub fn is_generating(&self) -> bool {
        lock(&self.inner).generating
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.inner).error.clone()
    }
}
