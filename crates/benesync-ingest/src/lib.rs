//! Batch ingestion: schema reconciliation + ID-keyed upsert
//!
//! One batch goes through:
//! 1. Snapshot the sheet
//! 2. Merge the batch's keys into the header ([`reconcile_headers`])
//! 3. Rewrite the header row if it changed (before any row write)
//! 4. Build the [`ExistingIdIndex`] from the snapshot
//! 5. Update matched rows in place, append the rest as one block
//!
//! # Example
//!
//! ```rust,ignore
//! use benesync_ingest::Ingestor;
//! use benesync_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let ingestor = Ingestor::new(Arc::new(MemoryStore::new("Sheet1")));
//! let response = ingestor
//!     .ingest_json(br#"[{"ID":"1","Name":"Asha","Email":"a@x.com"}]"#)
//!     .await;
//! assert!(response.is_success());
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod index;
pub mod response;
pub mod schema;
pub mod upsert;

pub use error::IngestError;
pub use index::ExistingIdIndex;
pub use response::{IngestResponse, ResponseStatus};
pub use schema::{reconcile_headers, Reconciliation};
pub use upsert::{project, UpsertEngine, UpsertSummary};

use benesync_store::{Record, TabularStore, HEADER_ROW, ID_COLUMN};
use std::sync::Arc;

/// What a batch did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Empty batch, store untouched
    NoData,
    /// Batch applied
    Applied(UpsertSummary),
}

/// Entry point for dashboard batches
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn TabularStore>,
    engine: UpsertEngine,
}

impl Ingestor {
    /// Create ingestor over a store
    #[must_use]
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self {
            engine: UpsertEngine::new(store.clone()),
            store,
        }
    }

    /// Reconcile and upsert one batch
    ///
    /// # Errors
    /// - `IngestError::MissingColumn` if the finalized header has no ID
    ///   column (checked before any write)
    /// - `IngestError::Store` on any store failure
    pub async fn ingest(&self, records: &[Record]) -> Result<IngestOutcome, IngestError> {
        if records.is_empty() {
            tracing::info!("empty batch, nothing to process");
            return Ok(IngestOutcome::NoData);
        }

        tracing::info!(records = records.len(), sheet = self.store.name(), "ingesting batch");

        let snapshot = self.store.snapshot().await?;
        let existing = snapshot.header();
        let reconciliation = reconcile_headers(&existing, records);

        if !reconciliation.header.contains(ID_COLUMN) {
            return Err(IngestError::MissingColumn(ID_COLUMN.to_string()));
        }

        if reconciliation.needs_write {
            tracing::info!(added = ?reconciliation.added, "rewriting header row");
            self.store
                .write_row(HEADER_ROW, &reconciliation.header.to_cells())
                .await?;
        }

        let index = ExistingIdIndex::build(&snapshot, &existing);
        let summary = self
            .engine
            .apply(&reconciliation.header, &index, records)
            .await?;

        tracing::info!(
            processed = summary.processed,
            added = summary.added,
            updated = summary.updated,
            "batch applied"
        );
        Ok(IngestOutcome::Applied(summary))
    }

    /// Decode a request body and ingest it; never fails, errors become an
    /// error response
    pub async fn ingest_json(&self, body: &[u8]) -> IngestResponse {
        let result = match parse_batch(body) {
            Ok(records) => self.ingest(&records).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::error!(error = %e, "batch failed");
        }
        result.into()
    }
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("store", &self.store.name())
            .finish()
    }
}

/// Decode a JSON array of flat objects
///
/// # Errors
/// - `IngestError::InvalidBatch` for anything but an array of objects
pub fn parse_batch(body: &[u8]) -> Result<Vec<Record>, IngestError> {
    serde_json::from_slice::<Vec<Record>>(body).map_err(|e| {
        IngestError::InvalidBatch(format!("expected a JSON array of objects ({e})"))
    })
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
