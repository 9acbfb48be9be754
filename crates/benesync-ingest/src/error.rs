//! Error types for batch ingestion

use benesync_store::StoreError;

/// Ingestion failure for a whole batch
///
/// There is no per-record error detail: a store failure mid-batch leaves
/// earlier writes committed, so callers treat the batch as at-least-once and
/// may resend it unchanged.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Body was not a JSON array of flat objects
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// A required column could not be established
    #[error("schema error: missing required column '{0}'")]
    MissingColumn(String),

    /// Store rejected a read or write
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Check if resending the same batch can succeed
    ///
    /// Store failures are transient from the caller's point of view and the
    /// upsert is idempotent by ID, so a resend is always safe.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Check if the failure concerns the sheet schema
    #[inline]
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::MissingColumn(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_error_display() {
        let err = IngestError::MissingColumn("ID".to_string());
        assert_eq!(err.to_string(), "schema error: missing required column 'ID'");
    }

    #[test]
    fn ingest_error_is_retryable() {
        assert!(IngestError::Store(StoreError::rejected("quota")).is_retryable());
        assert!(!IngestError::InvalidBatch("x".into()).is_retryable());
        assert!(IngestError::MissingColumn("ID".into()).is_schema_error());
    }
}
