//! Session resolution: who is the current user?
//!
//! The identity comes from two places: the launch URL (the OAuth callback
//! redirects to `...?user_id=<id>`) and the persisted device store. The URL
//! wins when it carries a non-zero id and is then written to the store. The
//! store is read exactly once per resolution and only written for
//! URL-sourced ids or on logout.

pub mod store;

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::errors::SessionError;
use crate::gateway::Gateway;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, USER_ID_KEY};

pub const GUEST_USERNAME: &str = "Guest";

/// Resolved identity of the current user.
///
/// `authenticated` always equals `user_id != 0`; the constructors are the only
/// way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: u64,
    username: String,
    authenticated: bool,
}

impl Session {
    pub fn guest() -> Self {
        Self {
            user_id: 0,
            username: GUEST_USERNAME.to_string(),
            authenticated: false,
        }
    }

    /// A session for `user_id`; an id of 0 yields the guest session.
    pub fn for_user(user_id: u64, username: impl Into<String>) -> Self {
        if user_id == 0 {
            return Self::guest();
        }
        let username = username.into();
        let username = if username.trim().is_empty() {
            GUEST_USERNAME.to_string()
        } else {
            username
        };
        Self {
            user_id,
            username,
            authenticated: true,
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::guest()
    }
}

/// Parse an id the way the dashboard did: an optional `+` then leading
/// digits, anything else is 0.
pub fn parse_user_id(raw: &str) -> u64 {
    let raw = raw.trim();
    let digits: String = raw
        .strip_prefix('+')
        .unwrap_or(raw)
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Extract `user_id` from a launch URL.
///
/// Accepts a full URL (`http://localhost:5173/?user_id=42`), a bare query
/// string (`?user_id=42` or `user_id=42`). Missing or malformed values yield 0.
pub fn user_id_from_url(raw: &str) -> u64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }

    let parsed = Url::parse(raw).or_else(|_| {
        let query = if raw.starts_with('?') {
            raw.to_string()
        } else {
            format!("?{}", raw)
        };
        Url::parse("http://localhost/").and_then(|base| base.join(&query))
    });

    match parsed {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == USER_ID_KEY)
            .map(|(_, v)| parse_user_id(&v))
            .unwrap_or(0),
        Err(e) => {
            debug!(error = %e, "launch URL could not be parsed");
            0
        }
    }
}

/// A session together with any storage write that failed while producing it.
#[derive(Debug)]
pub struct Resolution {
    pub session: Session,
    /// Set when a URL-sourced id could not be written, or a logout could not
    /// remove the stored id.
    pub storage_error: Option<SessionError>,
}

/// Resolves and tears down the session.
pub struct SessionResolver {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn SessionStore>,
}

impl SessionResolver {
    pub fn new(gateway: Arc<dyn Gateway>, store: Arc<dyn SessionStore>) -> Self {
        Self { gateway, store }
    }

    /// Determine the current session from the launch URL and persisted storage.
    ///
    /// Never fails: unreadable storage counts as absent, and a failed profile
    /// lookup keeps the session authenticated under the name `Guest`.
    pub async fn resolve(&self, launch_url: Option<&str>) -> Session {
        self.resolve_reporting(launch_url).await.session
    }

    /// Like [`resolve`](Self::resolve), but hands back a failed write of the
    /// launch URL's id so the caller can tell the user it was not saved.
    pub async fn resolve_reporting(&self, launch_url: Option<&str>) -> Resolution {
        let url_id = launch_url.map(user_id_from_url).unwrap_or(0);
        let stored_id = match self.store.get_item(USER_ID_KEY) {
            Ok(value) => value.as_deref().map(parse_user_id).unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "failed to read stored session");
                0
            }
        };

        let mut storage_error = None;
        let user_id = if url_id != 0 {
            if let Err(e) = self.store.set_item(USER_ID_KEY, &url_id.to_string()) {
                warn!(error = %e, user_id = url_id, "failed to persist user id");
                storage_error = Some(e);
            }
            url_id
        } else {
            stored_id
        };

        if user_id == 0 {
            debug!("no user id in launch URL or storage");
            return Resolution {
                session: Session::guest(),
                storage_error,
            };
        }

        let session = match self.gateway.get_user(user_id).await {
            Ok(user) => {
                info!(user_id, username = %user.username, "session resolved");
                Session::for_user(user_id, user.username)
            }
            Err(e) => {
                warn!(user_id, error = %e, "failed to fetch user profile");
                Session::for_user(user_id, GUEST_USERNAME)
            }
        };
        Resolution {
            session,
            storage_error,
        }
    }

    /// Clear persisted storage and reset to the guest session. No network call.
    ///
    /// The session is the guest one even when removal fails; the error is
    /// handed back because the next resolution will still find the stored id.
    pub fn logout(&self) -> Resolution {
        let storage_error = match self.store.remove_item(USER_ID_KEY) {
            Ok(()) => {
                info!("logged out");
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to clear stored session");
                Some(e)
            }
        };
        Resolution {
            session: Session::guest(),
            storage_error,
        }
    }
}
