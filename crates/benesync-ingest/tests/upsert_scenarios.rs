//! Batch ingestion against an in-memory sheet

use benesync_ingest::{IngestError, IngestOutcome, Ingestor, ResponseStatus, UpsertSummary};
use benesync_store::{CellValue, MemoryStore, Record, TabularStore};
use benesync_test_utils::{record, sheet, FlakyStore};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

fn ingestor_over(store: &Arc<MemoryStore>) -> Ingestor {
    Ingestor::new(store.clone())
}

#[tokio::test]
async fn empty_store_first_batch_establishes_header() {
    let store = Arc::new(MemoryStore::new("Sheet1"));
    let response = ingestor_over(&store)
        .ingest_json(br#"[{"ID":"1","Name":"Asha","Email":"a@x.com"}]"#)
        .await;

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.message, "Processed 1 records. Added: 1, Updated: 0");

    let grid = store.grid().unwrap();
    assert_eq!(grid.header().names(), ["ID", "Name", "Email"]);
    assert_eq!(grid.last_row(), 2);
    assert_eq!(grid.cell(2, 3), &CellValue::from("a@x.com"));
}

#[tokio::test]
async fn existing_id_is_updated_in_place_and_absent_fields_blanked() {
    let store = Arc::new(MemoryStore::with_grid(
        "Sheet1",
        sheet(&[&["ID", "Name", "Email"], &["1", "Asha", "a@x.com"]]),
    ));
    let response = ingestor_over(&store)
        .ingest_json(br#"[{"ID":"1","Name":"Asha K"}]"#)
        .await;

    assert_eq!(response.message, "Processed 1 records. Added: 0, Updated: 1");

    let grid = store.grid().unwrap();
    assert_eq!(grid.last_row(), 2);
    assert_eq!(grid.cell(2, 2), &CellValue::from("Asha K"));
    // projection writes every header column, so Email is cleared
    assert_eq!(grid.cell(2, 3), &CellValue::Empty);
}

#[tokio::test]
async fn empty_batch_reports_no_data_and_does_not_touch_store() {
    let store = Arc::new(FlakyStore::new(MemoryStore::missing("Sheet1")));
    let ingestor = Ingestor::new(store.clone());

    let response = ingestor.ingest_json(b"[]").await;

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.message, "No data to process");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn invalid_body_is_an_error_response() {
    let store = Arc::new(MemoryStore::new("Sheet1"));
    let response = ingestor_over(&store).ingest_json(b"{\"ID\": 1}").await;

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.message.starts_with("invalid batch"));
    assert!(store.grid().unwrap().is_empty());
}

#[tokio::test]
async fn missing_sheet_is_an_error_response() {
    let store = Arc::new(MemoryStore::missing("Sheet1"));
    let response = ingestor_over(&store)
        .ingest_json(br#"[{"ID":"1"}]"#)
        .await;

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.message.contains("sheet not found"));
}

#[tokio::test]
async fn updates_land_before_append_block() {
    let store = Arc::new(FlakyStore::new(MemoryStore::with_grid(
        "Sheet1",
        sheet(&[&["ID", "Name"], &["1", "Asha"], &["2", "Ravi"]]),
    )));
    let ingestor = Ingestor::new(store.clone());

    let batch = vec![
        record(&[("ID", "3"), ("Name", "Meera")]),
        record(&[("ID", "2"), ("Name", "Ravi K")]),
        record(&[("ID", "4"), ("Name", "Kiran")]),
        record(&[("ID", "1"), ("Name", "Asha K")]),
    ];
    let outcome = ingestor.ingest(&batch).await.unwrap();

    assert_eq!(
        outcome,
        IngestOutcome::Applied(UpsertSummary { processed: 4, added: 2, updated: 2 })
    );
    assert_eq!(
        store.write_log(),
        vec!["write_row:3", "write_row:2", "append_rows:4+2"]
    );

    let grid = store.inner().grid().unwrap();
    assert_eq!(grid.cell(4, 2), &CellValue::from("Meera"));
    assert_eq!(grid.cell(5, 2), &CellValue::from("Kiran"));
}

#[tokio::test]
async fn store_failure_mid_batch_is_one_error_and_resend_converges() {
    let store = Arc::new(FlakyStore::new(MemoryStore::with_grid(
        "Sheet1",
        sheet(&[&["ID", "Name"], &["1", "Asha"], &["2", "Ravi"]]),
    )));
    store.fail_writes_after(1);
    let ingestor = Ingestor::new(store.clone());

    let batch = vec![
        record(&[("ID", "1"), ("Name", "Asha K")]),
        record(&[("ID", "2"), ("Name", "Ravi K")]),
        record(&[("ID", "3"), ("Name", "Meera")]),
    ];

    let err = ingestor.ingest(&batch).await.unwrap_err();
    assert!(matches!(err, IngestError::Store(_)));
    assert!(err.is_retryable());

    // first update committed, the rest did not
    let partial = store.inner().grid().unwrap();
    assert_eq!(partial.cell(2, 2), &CellValue::from("Asha K"));
    assert_eq!(partial.cell(3, 2), &CellValue::from("Ravi"));

    store.heal();
    ingestor.ingest(&batch).await.unwrap();

    let grid = store.inner().grid().unwrap();
    assert_eq!(grid.last_row(), 4);
    assert_eq!(grid.cell(3, 2), &CellValue::from("Ravi K"));
    assert_eq!(grid.cell(4, 1), &CellValue::from("3"));
}

#[tokio::test]
async fn records_without_id_always_append() {
    let store = Arc::new(MemoryStore::with_grid(
        "Sheet1",
        sheet(&[&["ID", "Name"], &["1", "Asha"]]),
    ));
    let ingestor = ingestor_over(&store);
    let batch = vec![record(&[("Name", "Walk-in")])];

    ingestor.ingest(&batch).await.unwrap();
    ingestor.ingest(&batch).await.unwrap();

    assert_eq!(store.grid().unwrap().last_row(), 4);
}

// --- properties -----------------------------------------------------------

const COLUMNS: &[&str] = &["ID", "Name", "Email", "HGB", "Status", "Area Code"];

fn arb_record() -> impl Strategy<Value = Record> {
    (
        0u8..12,
        proptest::sample::subsequence(COLUMNS[1..].to_vec(), 0..COLUMNS.len() - 1),
        "[a-z]{0,6}",
    )
        .prop_map(|(id, columns, value)| {
            let mut rec = Record::new().with("ID", id.to_string());
            for column in columns {
                rec.insert(column, value.as_str());
            }
            rec
        })
}

fn arb_batch() -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec(arb_record(), 1..8)
}

fn arb_seed() -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec(arb_record(), 0..6)
}

fn run<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

proptest! {
    #[test]
    fn prop_same_batch_twice_is_idempotent(seed in arb_seed(), batch in arb_batch()) {
        run(async {
            let store = Arc::new(MemoryStore::new("Sheet1"));
            let ingestor = Ingestor::new(store.clone());
            if !seed.is_empty() {
                ingestor.ingest(&seed).await.unwrap();
            }

            ingestor.ingest(&batch).await.unwrap();
            let first = store.grid().unwrap();
            ingestor.ingest(&batch).await.unwrap();
            let second = store.grid().unwrap();

            prop_assert_eq!(first.last_row(), second.last_row());
            prop_assert_eq!(first, second);
            Ok(())
        })?;
    }

    #[test]
    fn prop_header_is_ordered_superset(seed in arb_seed(), batch in arb_batch()) {
        run(async {
            let store = Arc::new(MemoryStore::new("Sheet1"));
            let ingestor = Ingestor::new(store.clone());
            if !seed.is_empty() {
                ingestor.ingest(&seed).await.unwrap();
            }
            let before = store.snapshot().await.unwrap().header();

            ingestor.ingest(&batch).await.unwrap();
            let after = store.snapshot().await.unwrap().header();

            prop_assert_eq!(&after.names()[..before.len()], before.names());
            for key in batch.iter().flat_map(Record::keys) {
                prop_assert!(after.contains(key));
            }
            let mut seen = std::collections::HashSet::new();
            prop_assert!(after.names().iter().all(|h| seen.insert(h.clone())));
            Ok(())
        })?;
    }

    #[test]
    fn prop_row_count_never_decreases(batches in proptest::collection::vec(arb_batch(), 1..5)) {
        run(async {
            let store = Arc::new(MemoryStore::new("Sheet1"));
            let ingestor = Ingestor::new(store.clone());
            let mut last = 0;
            for batch in &batches {
                ingestor.ingest(batch).await.unwrap();
                let now = store.grid().unwrap().last_row();
                prop_assert!(now >= last);
                last = now;
            }
            Ok(())
        })?;
    }
}
