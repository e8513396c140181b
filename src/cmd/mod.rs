//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                          |
//! |-----------|-------------------------------------------|
//! | `session` | `Login`, `Session`, `Logout`, `Repos`     |
//! | `issues`  | `Issues`, `Issue`                         |
//! | `fix`     | `Fix`                                     |
//! | `config`  | `Config`                                  |

pub mod config;
pub mod fix;
pub mod issues;
pub mod session;

pub use config::cmd_config;
pub use fix::cmd_fix;
pub use issues::{cmd_issue, cmd_issues};
pub use session::{cmd_login, cmd_logout, cmd_repos, cmd_session};

use std::sync::Arc;

use anyhow::{Context, Result};
use automerge_ai::config::Config;
use automerge_ai::gateway::HttpGateway;
use automerge_ai::session::{FileSessionStore, Session, SessionResolver};

use crate::Cli;

/// Shared handles every network-backed command needs.
pub struct AppContext {
    pub config: Config,
    pub gateway: Arc<HttpGateway>,
    pub resolver: SessionResolver,
}

impl AppContext {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.data_dir.clone(), cli.api_url.clone())
            .context("Failed to load configuration")?;
        let gateway = Arc::new(HttpGateway::new(&config).context("Failed to build HTTP client")?);
        let store = Arc::new(FileSessionStore::new(config.session_file()));
        let resolver = SessionResolver::new(gateway.clone(), store);
        Ok(Self {
            config,
            gateway,
            resolver,
        })
    }

    /// Resolve the stored session, failing with a login hint for guests.
    pub async fn require_session(&self) -> Result<Session> {
        let session = self.resolver.resolve(None).await;
        if !session.is_authenticated() {
            anyhow::bail!("Not signed in. Run 'automerge login' first.");
        }
        Ok(session)
    }
}
