use std::fmt;

use serde::{Deserialize, Serialize};

/// Profile returned by the user lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A repository the user can browse issues for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Split an `owner/name` repository name into its two parts.
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let (owner, name) = full_name.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}

/// Envelope of the repository listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryList {
    #[serde(default)]
    pub repos: Vec<Repository>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum IssueState {
    Open,
    Closed,
    Other(String),
}

impl IssueState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Other(s) => s,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl From<String> for IssueState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            _ => Self::Other(s),
        }
    }
}

impl From<IssueState> for String {
    fn from(state: IssueState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: u64,
    #[serde(default)]
    pub github_issue_id: Option<u64>,
    pub repo_full_name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub state: IssueState,
    pub html_url: String,
    pub created_at: String,
    #[serde(default)]
    pub is_ai_fixable: bool,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Issue {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Status the server assigns to a fix. The server stores it as free text
/// and switches it to `submitted` once the pull request exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum FixStatus {
    Pending,
    Approved,
    Rejected,
    Submitted,
    Other(String),
}

impl FixStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Submitted => "submitted",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for FixStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "submitted" => Self::Submitted,
            _ => Self::Other(s),
        }
    }
}

impl From<FixStatus> for String {
    fn from(status: FixStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fix {
    pub id: u64,
    pub content: String,
    pub status: FixStatus,
    pub created_at: String,
    #[serde(default)]
    pub is_submitted: bool,
    #[serde(default)]
    pub submission_message: Option<String>,
    #[serde(default)]
    pub pr_url: Option<String>,
}

impl Fix {
    /// True once a pull request was opened, whichever field the server set.
    pub fn was_submitted(&self) -> bool {
        self.is_submitted || self.status == FixStatus::Submitted
    }
}

/// Body of the submit-fix request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFixRequest {
    pub submission_message: String,
}

/// Criteria combined into a single issue query. All fields are ANDed server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub repo_scope: Option<String>,
    pub search_text: Option<String>,
    pub label: Option<String>,
    pub ai_fixable_only: bool,
}

impl IssueFilter {
    /// Query parameters for the issue listing, `user_id` excluded.
    ///
    /// Absent or empty criteria are omitted, and `is_ai_fixable` is only sent
    /// when restricting to AI-fixable issues.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(repo) = non_empty(&self.repo_scope) {
            params.push(("repo_name", repo.to_string()));
        }
        if let Some(search) = non_empty(&self.search_text) {
            params.push(("search", search.to_string()));
        }
        if let Some(label) = non_empty(&self.label) {
            params.push(("label", label.to_string()));
        }
        if self.ai_fixable_only {
            params.push(("is_ai_fixable", "true".to_string()));
        }
        params
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Partial update merged into an [`IssueFilter`].
///
/// `None` leaves a field untouched; `Some(None)` or `Some(Some(""))` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub repo_scope: Option<Option<String>>,
    pub search_text: Option<Option<String>>,
    pub label: Option<Option<String>>,
    pub ai_fixable_only: Option<bool>,
}

impl FilterUpdate {
    pub fn repo_scope(mut self, repo: impl Into<String>) -> Self {
        self.repo_scope = Some(Some(repo.into()));
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(Some(text.into()));
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(Some(label.into()));
        self
    }

    pub fn ai_fixable_only(mut self, only: bool) -> Self {
        self.ai_fixable_only = Some(only);
        self
    }

    /// Merge into `filter`, normalizing blank strings to absent.
    pub fn apply_to(self, filter: &mut IssueFilter) {
        fn merge(slot: &mut Option<String>, update: Option<Option<String>>) {
            if let Some(value) = update {
                *slot = value
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
            }
        }
        merge(&mut filter.repo_scope, self.repo_scope);
        merge(&mut filter.search_text, self.search_text);
        merge(&mut filter.label, self.label);
        if let Some(only) = self.ai_fixable_only {
            filter.ai_fixable_only = only;
        }
    }
}
