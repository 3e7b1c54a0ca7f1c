//! Shared Error Types
//!
//! This module defines the failure taxonomy of the offline sync engine.
//! Every failure in the engine resolves to one of these variants, and every
//! variant resolves to a message status the UI can render - nothing here is
//! allowed to crash the host application.
//!
//! # Error Categories
//!
//! - `StorageUnavailable` - local persistence inaccessible; degrade to
//!   online-only operation
//! - `Connectivity` - a send was attempted with no usable network; queue
//!   the message and retry
//! - `RejectedByServer` - validation or authorization failure; terminal,
//!   never retried
//! - `RetryCeilingExceeded` - a queued entry failed repeatedly; terminal
//! - `ReconciliationConflict` - a pushed record matched no local
//!   placeholder; the record is appended rather than dropped
//!
//! # Usage
//!
//! ```rust
//! use safespace::shared::error::SyncError;
//!
//! let error = SyncError::rejected(400, "Content is required for text messages");
//! assert!(!error.is_transient());
//! ```
use thiserror::Error;

/// Failures that can occur anywhere in the sync engine
#[derive(Debug, Error, Clone)]
pub enum SyncError {
    /// Local persistence is inaccessible (private browsing, disabled
    /// storage, corrupt database file)
    #[error("local storage unavailable: {message}")]
    StorageUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// A network send was attempted and the server was unreachable,
    /// timed out, or answered with a transient (5xx) status
    #[error("network unreachable: {message}")]
    Connectivity {
        /// Human-readable error message
        message: String,
    },

    /// The server understood the request and refused it
    #[error("rejected by server ({status}): {message}")]
    RejectedByServer {
        /// HTTP-style status code
        status: u16,
        /// Error message from the response body, if any
        message: String,
    },

    /// A queued entry failed more times than the retry ceiling allows
    #[error("message {local_id} exceeded the retry ceiling")]
    RetryCeilingExceeded {
        /// Temporary id of the abandoned message
        local_id: String,
    },

    /// A pushed record could not be matched to any local placeholder
    #[error("pushed record {message_id} matched no local placeholder")]
    ReconciliationConflict {
        /// Durable id of the pushed record
        message_id: String,
    },
}

impl SyncError {
    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Create a new connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    /// Create a new rejected-by-server error
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::RejectedByServer {
            status,
            message: message.into(),
        }
    }

    /// Whether a retry can reasonably succeed later.
    ///
    /// Transient failures send the message to the outbound queue; terminal
    /// failures surface immediately as an `error` status.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connectivity { .. } | Self::StorageUnavailable { .. }
        )
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage(err.to_string())
    }
}
