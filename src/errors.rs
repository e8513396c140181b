//! Typed error hierarchy for the AutoMerge AI client.
//!
//! Three top-level enums cover the three subsystems:
//! - `GatewayError` — failures talking to the remote API
//! - `SessionError` — persisted session storage failures
//! - `FixError` — fix lifecycle rule violations and gateway failures

use thiserror::Error;

/// Errors from the API gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    /// The requested entity does not exist.
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// Success status, but the body did not match the expected shape.
    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayError {
    /// HTTP status carried by the failure, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Request { status, .. } => Some(*status),
            GatewayError::NotFound { .. } => Some(404),
            GatewayError::Network(_) | GatewayError::Decode { .. } => None,
        }
    }
}

/// Errors from the persisted session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read session file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write session file at {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file at {path} is corrupt: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the fix lifecycle controller.
#[derive(Debug, Error)]
pub enum FixError {
    #[error("A fix is already being generated for issue {issue_id}")]
    GenerationInFlight { issue_id: u64 },

    #[error("Another operation is already running for fix {fix_id}")]
    FixBusy { fix_id: u64 },

    #[error("Fix {fix_id} has already been submitted")]
    AlreadySubmitted { fix_id: u64 },

    #[error("Fix {fix_id} is not listed for issue {issue_id}")]
    UnknownFix { issue_id: u64, fix_id: u64 },

    #[error("Issue {issue_id} is not AI-fixable")]
    NotAiFixable { issue_id: u64 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_request_error_carries_status_and_message() {
        let err = GatewayError::Request {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        let text = err.to_string();
        assert!(text.contains("502"));
        assert!(text.contains("bad gateway"));
    }

    #[test]
    fn gateway_not_found_reports_404() {
        let err = GatewayError::NotFound {
            entity: "Issue 7".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Issue 7 not found");
    }

    #[test]
    fn session_error_write_failed_carries_path() {
        use std::path::PathBuf;
        let path = PathBuf::from("/data/session.json");
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = SessionError::WriteFailed {
            path: path.clone(),
            source: io_err,
        };
        match &err {
            SessionError::WriteFailed { path: p, source: s } => {
                assert_eq!(p, &path);
                assert_eq!(s.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected WriteFailed"),
        }
    }

    #[test]
    fn fix_error_converts_from_gateway_error() {
        let inner = GatewayError::Request {
            status: 500,
            message: "boom".to_string(),
        };
        let fix_err: FixError = inner.into();
        match &fix_err {
            FixError::Gateway(GatewayError::Request { status, message }) => {
                assert_eq!(*status, 500);
                assert_eq!(message, "boom");
            }
            _ => panic!("Expected FixError::Gateway(Request {{ .. }})"),
        }
    }

    #[test]
    fn fix_error_variants_are_distinct() {
        let busy = FixError::FixBusy { fix_id: 1 };
        let submitted = FixError::AlreadySubmitted { fix_id: 1 };
        assert!(matches!(busy, FixError::FixBusy { .. }));
        assert!(!matches!(submitted, FixError::FixBusy { .. }));
        assert!(submitted.to_string().contains("already been submitted"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&GatewayError::NotFound {
            entity: "x".into(),
        });
        assert_std_error(&FixError::GenerationInFlight { issue_id: 3 });
        assert_std_error(&SessionError::Corrupt {
            path: "x".into(),
            source: serde_json::from_str::<u8>("nope").unwrap_err(),
        });
    }
}
