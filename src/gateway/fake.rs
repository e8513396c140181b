//! In-memory `Gateway` used by the controller tests.
//!
//! Holds a small server-side store of issues and fixes, records every call,
//! and can fail or hold back individual operations on demand.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::Gateway;
use crate::errors::GatewayError;
use crate::models::{Fix, FixStatus, Issue, IssueFilter, IssueState, Repository, User};

#[derive(Default)]
struct Store {
    users: HashMap<u64, User>,
    repos: Vec<Repository>,
    issues: Vec<Issue>,
    fixes: HashMap<u64, Vec<Fix>>,
    next_fix_id: u64,
}

#[derive(Default)]
pub struct FakeGateway {
    store: Mutex<Store>,
    failures: Mutex<HashMap<&'static str, GatewayError>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

pub fn issue(id: u64, title: &str, ai_fixable: bool) -> Issue {
    Issue {
        id,
        github_issue_id: Some(1000 + id),
        repo_full_name: "octo/app".to_string(),
        title: title.to_string(),
        description: format!("Description of {}", title),
        state: IssueState::Open,
        html_url: format!("https://github.com/octo/app/issues/{}", id),
        created_at: "2024-03-05T10:00:00".to_string(),
        is_ai_fixable: ai_fixable,
        labels: vec!["bug".to_string()],
    }
}

pub fn fix(id: u64) -> Fix {
    Fix {
        id,
        content: format!("patch {}", id),
        status: FixStatus::Pending,
        created_at: "2024-03-06T10:00:00".to_string(),
        is_submitted: false,
        submission_message: None,
        pr_url: None,
    }
}

pub fn server_error(message: &str) -> GatewayError {
    GatewayError::Request {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                next_fix_id: 100,
                ..Store::default()
            }),
            ..Self::default()
        }
    }

    pub fn with_user(self, id: u64, username: &str) -> Self {
        self.store.lock().unwrap().users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                avatar_url: None,
            },
        );
        self
    }

    pub fn with_repo(self, full_name: &str) -> Self {
        let name = full_name.rsplit('/').next().unwrap_or(full_name).to_string();
        self.store.lock().unwrap().repos.push(Repository {
            id: None,
            name,
            full_name: full_name.to_string(),
            description: None,
            html_url: None,
        });
        self
    }

    pub fn with_issue(self, issue: Issue) -> Self {
        self.store.lock().unwrap().issues.push(issue);
        self
    }

    pub fn with_fix(self, issue_id: u64, fix: Fix) -> Self {
        self.store
            .lock()
            .unwrap()
            .fixes
            .entry(issue_id)
            .or_default()
            .push(fix);
        self
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: GatewayError) {
        self.failures.lock().unwrap().insert(operation, error);
    }

    /// Hold the next call keyed by `key` until the returned sender fires.
    ///
    /// `list_issues` is keyed by its search text, other operations by name.
    pub fn gate(&self, key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    pub fn server_fixes(&self, issue_id: u64) -> Vec<Fix> {
        self.store
            .lock()
            .unwrap()
            .fixes
            .get(&issue_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn enter(&self, operation: &'static str, key: &str) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", operation, key));
        let gate = self.gates.lock().unwrap().remove(key);
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        match self.failures.lock().unwrap().remove(operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn matches_filter(issue: &Issue, filter: &IssueFilter) -> bool {
    if let Some(repo) = &filter.repo_scope
        && &issue.repo_full_name != repo
    {
        return false;
    }
    if let Some(label) = &filter.label
        && !issue.has_label(label)
    {
        return false;
    }
    if let Some(search) = &filter.search_text {
        let needle = search.to_lowercase();
        if !issue.title.to_lowercase().contains(&needle)
            && !issue.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    !filter.ai_fixable_only || issue.is_ai_fixable
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn get_user(&self, user_id: u64) -> Result<User, GatewayError> {
        self.enter("get_user", "get_user").await?;
        self.store
            .lock()
            .unwrap()
            .users
            .get(&user_id)
            .cloned()
            .ok_or(GatewayError::NotFound {
                entity: format!("User {}", user_id),
            })
    }

    async fn list_repositories(&self, _user_id: u64) -> Result<Vec<Repository>, GatewayError> {
        self.enter("list_repositories", "list_repositories").await?;
        Ok(self.store.lock().unwrap().repos.clone())
    }

    async fn get_repository(
        &self,
        _user_id: u64,
        owner: &str,
        repo: &str,
    ) -> Result<Repository, GatewayError> {
        self.enter("get_repository", "get_repository").await?;
        let full_name = format!("{}/{}", owner, repo);
        self.store
            .lock()
            .unwrap()
            .repos
            .iter()
            .find(|r| r.full_name == full_name)
            .cloned()
            .ok_or(GatewayError::NotFound {
                entity: format!("Repository {}", full_name),
            })
    }

    async fn list_issues(
        &self,
        _user_id: u64,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, GatewayError> {
        let key = filter.search_text.clone().unwrap_or_default();
        self.enter("list_issues", &key).await?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .issues
            .iter()
            .filter(|i| matches_filter(i, filter))
            .cloned()
            .collect())
    }

    async fn get_issue(&self, _user_id: u64, issue_id: u64) -> Result<Issue, GatewayError> {
        self.enter("get_issue", "get_issue").await?;
        self.store
            .lock()
            .unwrap()
            .issues
            .iter()
            .find(|i| i.id == issue_id)
            .cloned()
            .ok_or(GatewayError::NotFound {
                entity: format!("Issue {}", issue_id),
            })
    }

    async fn list_fixes(&self, _user_id: u64, issue_id: u64) -> Result<Vec<Fix>, GatewayError> {
        self.enter("list_fixes", "list_fixes").await?;
        Ok(self.server_fixes(issue_id))
    }

    async fn generate_fix(&self, _user_id: u64, issue_id: u64) -> Result<Fix, GatewayError> {
        self.enter("generate_fix", "generate_fix").await?;
        let mut store = self.store.lock().unwrap();
        store.next_fix_id += 1;
        let fix = fix(store.next_fix_id);
        store.fixes.entry(issue_id).or_default().push(fix.clone());
        Ok(fix)
    }

    async fn submit_fix(
        &self,
        _user_id: u64,
        fix_id: u64,
        message: &str,
    ) -> Result<Fix, GatewayError> {
        self.enter("submit_fix", "submit_fix").await?;
        let mut store = self.store.lock().unwrap();
        let fix = store
            .fixes
            .values_mut()
            .flat_map(|fixes| fixes.iter_mut())
            .find(|f| f.id == fix_id)
            .ok_or(GatewayError::NotFound {
                entity: format!("Fix {}", fix_id),
            })?;
        fix.is_submitted = true;
        fix.status = FixStatus::Submitted;
        fix.submission_message = Some(message.to_string());
        fix.pr_url = Some(format!("https://github.com/octo/app/pull/{}", fix_id));
        Ok(fix.clone())
    }

    async fn delete_fix(&self, _user_id: u64, fix_id: u64) -> Result<(), GatewayError> {
        self.enter("delete_fix", "delete_fix").await?;
        let mut store = self.store.lock().unwrap();
        let mut found = false;
        for fixes in store.fixes.values_mut() {
            let before = fixes.len();
            fixes.retain(|f| f.id != fix_id);
            found |= fixes.len() != before;
        }
        if found {
            Ok(())
        } else {
            Err(GatewayError::NotFound {
                entity: format!("Fix {}", fix_id),
            })
        }
    }
}
