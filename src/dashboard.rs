//! Dashboard bootstrap: resolve the session, then load the user's repositories.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::gateway::Gateway;
use crate::models::Repository;
use crate::session::{Session, SessionResolver};

pub const LOAD_USER_ERROR: &str = "Failed to load user data. Please try logging in again.";

/// What the dashboard home page shows.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub session: Session,
    pub repos: Vec<Repository>,
    pub error: Option<String>,
}

impl Dashboard {
    /// Resolve the session and, when authenticated, fetch its repositories.
    ///
    /// A guest gets an empty dashboard without touching the network beyond the
    /// resolver. A failed repository fetch leaves the list empty and records
    /// [`LOAD_USER_ERROR`]; the session itself is kept.
    pub async fn load(
        resolver: &SessionResolver,
        gateway: Arc<dyn Gateway>,
        launch_url: Option<&str>,
    ) -> Self {
        let session = resolver.resolve(launch_url).await;
        if !session.is_authenticated() {
            debug!("guest session, skipping repository load");
            return Self {
                session,
                ..Self::default()
            };
        }

        match gateway.list_repositories(session.user_id()).await {
            Ok(repos) => Self {
                session,
                repos,
                error: None,
            },
            Err(e) => {
                warn!(user_id = session.user_id(), error = %e, "failed to load repositories");
                Self {
                    session,
                    repos: Vec::new(),
                    error: Some(LOAD_USER_ERROR.to_string()),
                }
            }
        }
    }
}
