//! Error taxonomy for listing operations.
//!
//! Local failures (validation, missing session, busy rows, declined
//! confirmation) are raised before any request goes out. Remote failures
//! are either a transport failure or a non-success status with its body.

use crate::sync::OperationKind;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),

    #[error("Log in first (no token).")]
    NotAuthenticated,

    #[error("Property #{0} is not in the list (load properties again).")]
    NotFoundLocally(i64),

    #[error("Property #{id} already has a {kind} in flight.")]
    Busy { id: i64, kind: OperationKind },

    #[error("Delete of property #{0} cancelled.")]
    Cancelled(i64),

    #[error("{0}")]
    Transport(String),

    #[error("({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SyncError {
    /// Malformed or stale local input, rejected before any request
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFoundLocally(_))
    }

    /// True when the failure happened without reaching the server
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotAuthenticated
                | Self::NotFoundLocally(_)
                | Self::Busy { .. }
                | Self::Cancelled(_)
        )
    }

    /// Human-readable status line for a failed `action`
    pub fn describe(&self, action: &str) -> String {
        match self {
            Self::Rejected { status, body } => format!("{action} error ({status}): {body}"),
            Self::Transport(msg) | Self::Decode(msg) => format!("{action} fetch error: {msg}"),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
