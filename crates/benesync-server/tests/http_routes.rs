//! Ingestion endpoint and liveness probe, in process
//!
//! Tests that enable the ingest lock each use their own lock name: the lock
//! registry is process-wide.

use benesync_delivery::NamedLock;
use benesync_ingest::{IngestResponse, ResponseStatus};
use benesync_server::{routes, Service, ServiceConfig, LIVENESS_TEXT};
use benesync_store::{CellValue, MemoryStore};
use benesync_test_utils::sheet;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use warp::http::StatusCode;

fn service(store: Arc<MemoryStore>, config: ServiceConfig) -> Arc<Service> {
    Arc::new(Service::with_store(config, store).unwrap())
}

async fn post(service: &Arc<Service>, body: &str) -> IngestResponse {
    let res = warp::test::request()
        .method("POST")
        .path("/")
        .body(body.to_string())
        .reply(&routes(service.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    serde_json::from_slice(res.body()).unwrap()
}

#[tokio::test]
async fn get_root_is_liveness_probe() {
    let svc = service(Arc::new(MemoryStore::new("Sheet1")), ServiceConfig::new());

    let res = warp::test::request()
        .method("GET")
        .path("/")
        .reply(&routes(svc))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), LIVENESS_TEXT.as_bytes());
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let svc = service(Arc::new(MemoryStore::new("Sheet1")), ServiceConfig::new());

    let res = warp::test::request()
        .method("GET")
        .path("/admin")
        .reply(&routes(svc))
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_ingests_into_empty_sheet() {
    let store = Arc::new(MemoryStore::new("Sheet1"));
    let svc = service(store.clone(), ServiceConfig::new());

    let response = post(&svc, r#"[{"ID":"1","Name":"Asha","Email":"a@x.com"}]"#).await;

    assert_eq!(
        response,
        IngestResponse::success("Processed 1 records. Added: 1, Updated: 0")
    );
    let grid = store.grid().unwrap();
    assert_eq!(grid.header().names(), ["ID", "Name", "Email"]);
    assert_eq!(grid.cell(2, 2), &CellValue::from("Asha"));
}

#[tokio::test]
async fn post_updates_existing_row() {
    let store = Arc::new(MemoryStore::with_grid(
        "Sheet1",
        sheet(&[&["ID", "Name", "Email"], &["1", "Asha", "a@x.com"]]),
    ));
    let svc = service(store.clone(), ServiceConfig::new());

    let response = post(&svc, r#"[{"ID":"1","Name":"Asha K"}]"#).await;

    assert_eq!(response.message, "Processed 1 records. Added: 0, Updated: 1");
    let grid = store.grid().unwrap();
    assert_eq!(grid.last_row(), 2);
    assert_eq!(grid.cell(2, 2), &CellValue::from("Asha K"));
    assert!(grid.cell(2, 3).is_blank());
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let store = Arc::new(MemoryStore::new("Sheet1"));
    let svc = service(store.clone(), ServiceConfig::new());

    let response = post(&svc, "[]").await;

    assert_eq!(response, IngestResponse::success("No data to process"));
    assert!(store.grid().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_body_is_an_error_with_200() {
    let store = Arc::new(MemoryStore::new("Sheet1"));
    let svc = service(store.clone(), ServiceConfig::new());

    let response = post(&svc, r#"{"ID":"1"}"#).await;

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(store.grid().unwrap().is_empty());
}

#[tokio::test]
async fn missing_sheet_is_an_error_with_200() {
    let svc = service(Arc::new(MemoryStore::missing("Sheet1")), ServiceConfig::new());

    let response = post(&svc, r#"[{"ID":"1"}]"#).await;

    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.message.contains("Sheet1"));
}

#[tokio::test]
async fn ingest_lock_blocks_while_delivery_holds_it() {
    let lock_name = "routes-test-ingest-locked";
    let store = Arc::new(MemoryStore::new("Sheet1"));
    let config = ServiceConfig::new()
        .with_lock_name(lock_name)
        .with_lock_timeout_secs(0)
        .with_ingest_lock(true);
    let svc = service(store.clone(), config);

    let held = NamedLock::new(lock_name).try_acquire().unwrap();
    let response = post(&svc, r#"[{"ID":"1"}]"#).await;
    assert_eq!(response.status, ResponseStatus::Error);
    assert!(store.grid().unwrap().is_empty());

    drop(held);
    let response = post(&svc, r#"[{"ID":"1"}]"#).await;
    assert!(response.is_success());
    assert_eq!(store.grid().unwrap().last_row(), 2);
}

#[tokio::test]
async fn ingest_ignores_delivery_lock_by_default() {
    let lock_name = "routes-test-ingest-unlocked";
    let store = Arc::new(MemoryStore::new("Sheet1"));
    let svc = service(
        store.clone(),
        ServiceConfig::new()
            .with_lock_name(lock_name)
            .with_lock_timeout_secs(0),
    );

    let _held = NamedLock::new(lock_name).try_acquire().unwrap();
    let response = post(&svc, r#"[{"ID":"1"}]"#).await;

    assert!(response.is_success());
}
