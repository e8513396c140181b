//! API gateway — the only place the client talks to the network.
//!
//! ## Endpoint Map
//!
//! | Operation           | Method | Path                                       |
//! |---------------------|--------|--------------------------------------------|
//! | `get_user`          | GET    | `/api/auth/github/user/{user_id}`          |
//! | `list_repositories` | GET    | `/api/auth/github/repos/{user_id}`         |
//! | `get_repository`    | GET    | `/api/github/repos/{owner}/{repo}`         |
//! | `list_issues`       | GET    | `/api/github/issues`                       |
//! | `get_issue`         | GET    | `/api/github/issues/{issue_id}`            |
//! | `list_fixes`        | GET    | `/api/issues/{issue_id}/fixes`             |
//! | `generate_fix`      | POST   | `/api/issues/issues/{issue_id}/generate-fix` |
//! | `submit_fix`        | POST   | `/api/issues/fixes/{fix_id}/submit`        |
//! | `delete_fix`        | DELETE | `/api/issues/fixes/{fix_id}`               |
//!
//! Every call is independent: no retries, no caching, no deduplication of
//! concurrent identical calls. Failures are returned to the caller as-is.

pub mod http;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::models::{Fix, Issue, IssueFilter, Repository, User};

pub use http::HttpGateway;

/// Typed access to the remote API.
/// Real implementation: `HttpGateway`. Test double: `fake::FakeGateway`.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get_user(&self, user_id: u64) -> Result<User, GatewayError>;

    async fn list_repositories(&self, user_id: u64) -> Result<Vec<Repository>, GatewayError>;

    async fn get_repository(
        &self,
        user_id: u64,
        owner: &str,
        repo: &str,
    ) -> Result<Repository, GatewayError>;

    async fn list_issues(
        &self,
        user_id: u64,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, GatewayError>;

    async fn get_issue(&self, user_id: u64, issue_id: u64) -> Result<Issue, GatewayError>;

    async fn list_fixes(&self, user_id: u64, issue_id: u64) -> Result<Vec<Fix>, GatewayError>;

    async fn generate_fix(&self, user_id: u64, issue_id: u64) -> Result<Fix, GatewayError>;

    async fn submit_fix(
        &self,
        user_id: u64,
        fix_id: u64,
        message: &str,
    ) -> Result<Fix, GatewayError>;

    async fn delete_fix(&self, user_id: u64, fix_id: u64) -> Result<(), GatewayError>;
}

/// Browser navigation target that starts the GitHub OAuth flow.
pub fn login_url(base_url: &str) -> String {
    format!("{}/api/auth/github/login", base_url.trim_end_matches('/'))
}
