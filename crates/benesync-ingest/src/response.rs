//! Wire response of the ingestion endpoint

use crate::error::IngestError;
use crate::IngestOutcome;
use serde::{Deserialize, Serialize};

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Batch stored
    Success,
    /// Batch rejected or failed
    Error,
}

/// `{status, message}` body returned to the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Success or error
    pub status: ResponseStatus,
    /// Human-readable summary
    pub message: String,
}

impl IngestResponse {
    /// Success response
    #[inline]
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
        }
    }

    /// Error response
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }

    /// Check for success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl From<&IngestOutcome> for IngestResponse {
    fn from(outcome: &IngestOutcome) -> Self {
        match outcome {
            IngestOutcome::NoData => Self::success("No data to process"),
            IngestOutcome::Applied(s) => Self::success(format!(
                "Processed {} records. Added: {}, Updated: {}",
                s.processed, s.added, s.updated
            )),
        }
    }
}

impl From<&IngestError> for IngestResponse {
    fn from(err: &IngestError) -> Self {
        Self::error(err.to_string())
    }
}

impl From<Result<IngestOutcome, IngestError>> for IngestResponse {
    fn from(result: Result<IngestOutcome, IngestError>) -> Self {
        match &result {
            Ok(outcome) => outcome.into(),
            Err(err) => err.into(),
        }
    }
}
