//! Error types for delivery
//!
//! Run-level errors ([`DeliveryError`]) abort the whole run before any row is
//! touched. Row-level errors ([`RowError`]) are caught, logged with the row's
//! ID and the loop moves on.

use benesync_report::ReportError;
use benesync_store::StoreError;
use std::path::PathBuf;
use std::time::Duration;

/// Named lock errors
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Lock not acquired within the wait bound
    #[error("lock {name:?} not acquired within {}ms", .waited.as_millis())]
    Timeout {
        /// Lock name
        name: String,
        /// Bound that elapsed
        waited: Duration,
    },

    /// Lock file could not be opened or locked
    #[error("lock file {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Mail transport errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Recipient address unusable
    #[error("invalid recipient: {0:?}")]
    InvalidRecipient(String),

    /// Relay answered with a non-success status
    #[error("mail relay rejected message: HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Relay unreachable or connection failed
    #[error("mail transport failed: {0}")]
    Transport(String),

    /// Envelope could not be encoded
    #[error("envelope encoding failed: {0}")]
    Codec(#[from] serde_json::Error),

    /// IO error writing to the outbox
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl MailError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if a resend could succeed without changing the message
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Io { .. } => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::InvalidRecipient(_) | Self::Codec(_) => false,
        }
    }
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Run-level delivery errors
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Another run holds the lock
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Required columns absent from the header row
    #[error("required columns missing: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Snapshot failed (including a missing sheet)
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl DeliveryError {
    /// Check if the run was aborted by lock contention
    #[inline]
    #[must_use]
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::Lock(LockError::Timeout { .. }))
    }
}

/// Failure scoped to one row
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// Row has an email but no ID
    #[error("row has no ID")]
    MissingId,

    /// Report generation or PDF export failed
    #[error("report failed: {0}")]
    Report(#[from] ReportError),

    /// Mail was not sent
    #[error("send failed: {0}")]
    Mail(#[from] MailError),

    /// Live status read or status write failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
