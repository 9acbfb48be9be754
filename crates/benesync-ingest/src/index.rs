//! Existing-ID index

use benesync_store::{Grid, HeaderRow, ID_COLUMN};
use std::collections::HashMap;

/// Trimmed ID → row number, taken from one snapshot
///
/// The index is a point-in-time view. It is rebuilt on every batch and is
/// never shared between batches; a concurrent writer can make it stale the
/// moment it is built. Callers that need strict correctness under concurrent
/// writers have to serialize ingestion externally.
#[derive(Debug, Clone, Default)]
pub struct ExistingIdIndex {
    rows: HashMap<String, usize>,
}

impl ExistingIdIndex {
    /// Build from a snapshot using the snapshot's own header
    ///
    /// Blank IDs are not indexed. When an ID occurs on several rows the
    /// highest row wins: a batch that appended the same new ID twice then
    /// resolves to the row holding its last record, which keeps a resend of
    /// that batch from changing anything.
    #[must_use]
    pub fn build(grid: &Grid, header: &HeaderRow) -> Self {
        let Some(id_column) = header.position(ID_COLUMN) else {
            return Self::default();
        };

        let mut rows = HashMap::new();
        for (number, _) in grid.data_rows() {
            let id = grid.cell(number, id_column).to_trimmed_string();
            if !id.is_empty() {
                rows.insert(id, number);
            }
        }
        Self { rows }
    }

    /// Row holding `id`, if any
    #[inline]
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<usize> {
        self.rows.get(id.trim()).copied()
    }

    /// Number of indexed IDs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when nothing is indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
