//! Schema reconciliation
//!
//! Merges the batch's field names into the sheet's header row. Columns are
//! only ever appended; existing order is never touched.

use benesync_store::{HeaderRow, Record};

/// Result of merging a batch's keys into the header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Finalized header, a superset of the existing one
    pub header: HeaderRow,
    /// Columns appended by this batch, in first-seen order
    pub added: Vec<String>,
    /// Whether the header row must be rewritten before any row write
    pub needs_write: bool,
}

/// Merge the keys of `records` into `existing`
///
/// Keys of the first record come first, then keys first seen in later
/// records. Names are compared after trimming, case-sensitively. Empty names
/// are never appended. An empty existing header always needs a write, since
/// the batch establishes the initial schema.
#[must_use]
pub fn reconcile_headers(existing: &HeaderRow, records: &[Record]) -> Reconciliation {
    let mut header = existing.clone();
    let mut added = Vec::new();

    for key in records.iter().flat_map(Record::keys) {
        let key = key.trim();
        if key.is_empty() || header.contains(key) {
            continue;
        }
        header.push(key);
        added.push(key.to_string());
    }

    let needs_write = existing.is_empty() || !added.is_empty();
    if needs_write {
        tracing::debug!(added = ?added, columns = header.len(), "header row changed");
    }

    Reconciliation {
        header,
        added,
        needs_write,
    }
}
