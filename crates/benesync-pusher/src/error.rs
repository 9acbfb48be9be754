//! Error types for the sync client

use std::path::PathBuf;

/// Push failures; none of them commit the cache
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// Request could not be sent or timed out
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with something other than HTTP 200
    #[error("endpoint returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Endpoint answered 200 but reported an error
    #[error("endpoint refused batch: {0}")]
    Refused(String),

    /// Cache file could not be written
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Cache or response body could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl PushError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if pushing the same batch again is reasonable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Refused(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Io { .. } | Self::Codec(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_error_retryable() {
        assert!(PushError::Refused("sheet not found".into()).is_retryable());
        assert!(PushError::Status { status: 502, body: String::new() }.is_retryable());
        assert!(!PushError::Status { status: 404, body: String::new() }.is_retryable());
    }
}
