//! JSON-file backend persistence

use benesync_store::{CellValue, JsonFileStore, StoreError, TabularStore};

#[tokio::test]
async fn json_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheets").join("beneficiaries.json");

    {
        let store = JsonFileStore::open(&path, "Sheet1").await.unwrap();
        assert_eq!(store.last_row().await.unwrap(), 0);

        store.write_row(1, &["ID".into(), "Name".into()]).await.unwrap();
        store
            .append_rows(2, &[vec!["1".into(), "Asha".into()]])
            .await
            .unwrap();
    }

    let reopened = JsonFileStore::open(&path, "Sheet1").await.unwrap();
    let grid = reopened.snapshot().await.unwrap();
    assert_eq!(grid.header().names(), ["ID", "Name"]);
    assert_eq!(grid.cell(2, 2), &CellValue::from("Asha"));
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn json_store_rejects_garbage_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"not json").unwrap();

    let result = JsonFileStore::open(&path, "Sheet1").await;
    assert!(matches!(result, Err(StoreError::Codec(_))));
}

#[tokio::test]
async fn json_store_numbers_keep_their_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("numbers.json");

    let store = JsonFileStore::open(&path, "Sheet1").await.unwrap();
    store.write_row(1, &["HGB".into()]).await.unwrap();
    store.write_cell(2, 1, CellValue::from(10.5)).await.unwrap();
    drop(store);

    let reopened = JsonFileStore::open(&path, "Sheet1").await.unwrap();
    assert_eq!(reopened.read_cell(2, 1).await.unwrap().to_trimmed_string(), "10.5");
}

#[tokio::test]
async fn two_handles_on_one_file_see_each_others_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.json");

    let a = JsonFileStore::open(&path, "Sheet1").await.unwrap();
    let b = JsonFileStore::open(&path, "Sheet1").await.unwrap();

    a.write_row(1, &["ID".into(), "Status".into()]).await.unwrap();
    a.append_rows(2, &[vec!["1".into(), "".into()]]).await.unwrap();
    assert_eq!(b.last_row().await.unwrap(), 2);

    b.write_cell(2, 2, "SENT".into()).await.unwrap();
    assert_eq!(a.read_cell(2, 2).await.unwrap(), CellValue::from("SENT"));

    // a's next write starts from the file, keeping b's status
    a.append_rows(3, &[vec!["2".into()]]).await.unwrap();
    let grid = b.snapshot().await.unwrap();
    assert_eq!(grid.last_row(), 3);
    assert_eq!(grid.cell(2, 2), &CellValue::from("SENT"));
}

#[tokio::test]
async fn concurrent_writers_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contended.json");
    let a = std::sync::Arc::new(JsonFileStore::open(&path, "Sheet1").await.unwrap());
    let b = std::sync::Arc::new(JsonFileStore::open(&path, "Sheet1").await.unwrap());

    let mut tasks = Vec::new();
    for (i, store) in [a.clone(), b.clone(), a, b].into_iter().enumerate() {
        tasks.push(tokio::spawn(async move {
            store.write_cell(1, i + 1, CellValue::from(format!("c{i}"))).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let reopened = JsonFileStore::open(&path, "Sheet1").await.unwrap();
    let grid = reopened.snapshot().await.unwrap();
    assert_eq!(grid.header().names(), ["c0", "c1", "c2", "c3"]);
}
