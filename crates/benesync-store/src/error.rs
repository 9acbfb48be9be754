//! Error types for store access

use std::path::PathBuf;

/// Errors raised by a [`crate::TabularStore`] backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named sheet does not exist
    #[error("sheet not found: {0}")]
    SheetMissing(String),

    /// Row or column outside the addressable range (both are 1-indexed)
    #[error("cell out of bounds: row {row}, column {column}")]
    OutOfBounds {
        /// Requested row
        row: usize,
        /// Requested column
        column: usize,
    },

    /// Backend refused the write
    #[error("write rejected: {0}")]
    Rejected(String),

    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Backing document could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create rejection error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Check if the sheet itself is absent
    #[inline]
    #[must_use]
    pub fn is_missing_sheet(&self) -> bool {
        matches!(self, Self::SheetMissing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::SheetMissing("Sheet1".to_string());
        assert_eq!(err.to_string(), "sheet not found: Sheet1");

        let err = StoreError::OutOfBounds { row: 0, column: 3 };
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn store_error_missing_sheet() {
        assert!(StoreError::SheetMissing("x".into()).is_missing_sheet());
        assert!(!StoreError::rejected("quota").is_missing_sheet());
    }
}
