//! ID-keyed upsert engine

use crate::error::IngestError;
use crate::index::ExistingIdIndex;
use benesync_store::{CellValue, HeaderRow, Record, TabularStore, HEADER_ROW};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Counts for one applied batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    /// Records seen
    pub processed: usize,
    /// Records appended as new rows
    pub added: usize,
    /// Records written over an existing row
    pub updated: usize,
}

/// Project a record onto the header order
///
/// Headers without a matching field become empty cells. This blanks any
/// column the record does not carry, including on update.
#[must_use]
pub fn project(header: &HeaderRow, record: &Record) -> Vec<CellValue> {
    header
        .names()
        .iter()
        .map(|name| record.get_or_empty(name).clone())
        .collect()
}

/// Writes a batch into the store
///
/// Matched records are written in place one row at a time (their rows are
/// not contiguous). Unmatched records are buffered and flushed as a single
/// block after the last row, so all updates land before the append block.
#[derive(Clone)]
pub struct UpsertEngine {
    store: Arc<dyn TabularStore>,
}

impl UpsertEngine {
    /// Create engine over a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { store }
    }

    /// Apply `records` in input order
    ///
    /// # Arguments
    /// * `header` - Finalized header, already written to the store
    /// * `index` - Existing-ID index built from the pre-batch snapshot
    /// * `records` - Batch in input order
    ///
    /// # Errors
    /// - `IngestError::Store` on the first rejected store call; writes made
    ///   before it stay committed
    pub async fn apply(
        &self,
        header: &HeaderRow,
        index: &ExistingIdIndex,
        records: &[Record],
    ) -> Result<UpsertSummary, IngestError> {
        let mut summary = UpsertSummary::default();
        let mut pending: Vec<Vec<CellValue>> = Vec::new();

        for record in records {
            summary.processed += 1;
            let row = project(header, record);
            let id = record.id();

            match id.as_deref().and_then(|id| index.lookup(id)) {
                Some(number) => {
                    tracing::debug!(row = number, id = id.as_deref().unwrap_or_default(), "updating row in place");
                    self.store.write_row(number, &row).await?;
                    summary.updated += 1;
                }
                None => {
                    tracing::debug!(id = id.as_deref().unwrap_or_default(), "queueing row for append");
                    pending.push(row);
                    summary.added += 1;
                }
            }
        }

        if !pending.is_empty() {
            let start = (self.store.last_row().await? + 1).max(HEADER_ROW + 1);
            tracing::debug!(start, rows = pending.len(), "appending block");
            self.store.append_rows(start, &pending).await?;
        }

        Ok(summary)
    }
}

impl std::fmt::Debug for UpsertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpsertEngine")
            .field("store", &self.store.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benesync_store::{Grid, MemoryStore};
    use pretty_assertions::assert_eq;

    fn seeded_store() -> Arc<MemoryStore> {
        let grid = Grid::new(vec![
            vec!["ID".into(), "Name".into(), "Email".into()],
            vec!["1".into(), "Asha".into(), "a@x.com".into()],
            vec!["2".into(), "Ravi".into(), "r@x.com".into()],
        ]);
        Arc::new(MemoryStore::with_grid("Sheet1", grid))
    }

    #[test]
    fn project_fills_missing_with_empty() {
        let header = HeaderRow::new(["ID", "Name", "Email"]);
        let record = Record::new().with("Email", "e@x.com").with("ID", "3").with("Extra", "x");

        assert_eq!(
            project(&header, &record),
            vec![CellValue::from("3"), CellValue::Empty, CellValue::from("e@x.com")]
        );
    }

    #[tokio::test]
    async fn apply_updates_and_appends() {
        let store = seeded_store();
        let snapshot = store.snapshot().await.unwrap();
        let header = snapshot.header();
        let index = ExistingIdIndex::build(&snapshot, &header);
        let engine = UpsertEngine::new(store.clone());

        let records = vec![
            Record::new().with("ID", "2").with("Name", "Ravi K").with("Email", "r@x.com"),
            Record::new().with("ID", "9").with("Name", "Meera"),
            Record::new().with("Name", "No Id"),
        ];
        let summary = engine.apply(&header, &index, &records).await.unwrap();

        assert_eq!(summary, UpsertSummary { processed: 3, added: 2, updated: 1 });

        let grid = store.grid().unwrap();
        assert_eq!(grid.last_row(), 5);
        assert_eq!(grid.cell(3, 2), &CellValue::from("Ravi K"));
        assert_eq!(grid.cell(4, 1), &CellValue::from("9"));
        assert_eq!(grid.cell(5, 2), &CellValue::from("No Id"));
        assert_eq!(grid.cell(5, 1), &CellValue::Empty);
    }

    #[tokio::test]
    async fn apply_with_no_records_touches_nothing() {
        let store = seeded_store();
        let before = store.grid();
        let engine = UpsertEngine::new(store.clone());

        let summary = engine
            .apply(&HeaderRow::new(["ID"]), &ExistingIdIndex::default(), &[])
            .await
            .unwrap();

        assert_eq!(summary, UpsertSummary::default());
        assert_eq!(store.grid(), before);
    }
}
