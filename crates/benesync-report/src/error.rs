//! Error types for report generation

use std::path::PathBuf;

/// Errors raised by an object store or template renderer backend
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// Document does not exist
    #[error("document not found: {0}")]
    NotFound(String),

    /// Name not usable as a document name
    #[error("invalid document name: {0:?}")]
    InvalidName(String),

    /// Backend refused the request
    #[error("object store rejected request: {0}")]
    Rejected(String),

    /// PDF conversion failed
    #[error("pdf export failed: {0}")]
    Export(String),

    /// IO error on the backing directory
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ObjectStoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create export error
    pub fn export(reason: impl std::fmt::Display) -> Self {
        Self::Export(reason.to_string())
    }

    /// Check if the document was missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Errors for one record's report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Record has no usable ID, so no deterministic name exists
    #[error("record has no ID")]
    MissingId,

    /// Backend failure while locating, duplicating, rendering or exporting
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_store_error_not_found() {
        assert!(ObjectStoreError::NotFound("x".into()).is_not_found());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(ObjectStoreError::io_error("/tmp/x", io).is_not_found());

        assert!(!ObjectStoreError::export("bad font").is_not_found());
    }

    #[test]
    fn report_error_is_transparent() {
        let err = ReportError::from(ObjectStoreError::NotFound("7_Report".into()));
        assert_eq!(err.to_string(), "document not found: 7_Report");
    }
}
