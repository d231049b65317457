//! Error types for the synchronization layer.
//!
//! Conversion and merge errors are local contracts: the caller decides whether
//! to abort or skip. Remote errors are surfaced as-is and never reconciled
//! against the local task collection.

use thiserror::Error;

use crate::model::TaskId;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A production order carried a value that could not be converted.
    #[error("Failed to parse {field} of production order {record}: {message}")]
    Parse {
        record: String,
        field: &'static str,
        message: String,
    },

    /// No endpoint was resolved from the host page and none was configured.
    #[error("No API endpoint could be resolved from the host page")]
    Configuration,

    /// An edit event referenced a key that is not tracked locally.
    #[error("No tracked task with id {0}")]
    NotFoundLocal(TaskId),

    /// The backend answered with a non-2xx status.
    #[error("Remote request failed (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// The request never produced a response.
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// A widget edit carried a value of the wrong shape.
    #[error("Invalid value for {field}: {message}")]
    InvalidEdit {
        field: &'static str,
        message: String,
    },

    /// Applying an edit would leave the task ending before it starts.
    #[error("Task would end ({end}) before it starts ({start})")]
    InvalidRange { start: String, end: String },

    /// The task has not been assigned a server identifier yet.
    #[error("Task '{0}' has no server-assigned id yet")]
    UnassignedId(String),

    /// The background request was torn down before it completed.
    #[error("Request did not complete: {0}")]
    Interrupted(String),
}

impl SyncError {
    /// `true` when the error came from the backend or the network.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::Remote { .. }
                | SyncError::Transport { .. }
                | SyncError::InvalidResponse { .. }
        )
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
