//! Testing utilities for benesync workspace
//!
//! Shared fixtures and fakes with failure injection.

#![allow(missing_docs)]

use benesync_delivery::{MailError, MailSender, OutgoingMail};
use benesync_report::{DocumentHandle, MemoryDrive, ObjectStore, ObjectStoreError, TemplateRenderer};
use benesync_store::{CellValue, Grid, MemoryStore, Record, StoreError, TabularStore};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn record(fields: &[(&str, &str)]) -> Record {
    fields.iter().map(|(k, v)| (*k, *v)).collect()
}

pub fn sheet(rows: &[&[&str]]) -> Grid {
    Grid::new(
        rows.iter()
            .map(|row| row.iter().map(|v| CellValue::from(*v)).collect())
            .collect(),
    )
}

/// Standard delivery sheet: ID, Name, Email, HGB, Status
pub fn delivery_sheet(rows: &[[&str; 5]]) -> Grid {
    let header: &[&str] = &["ID", "Name", "Email", "HGB", "Status"];
    let mut all = vec![header];
    all.extend(rows.iter().map(|r| r.as_slice()));
    sheet(&all)
}

type SnapshotHook = Box<dyn FnOnce(&MemoryStore) + Send>;

/// [`MemoryStore`] wrapper that counts calls, logs writes and fails on demand
pub struct FlakyStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    writes: AtomicUsize,
    fail_after: Mutex<Option<usize>>,
    write_log: Mutex<Vec<String>>,
    after_snapshot: Mutex<Option<SnapshotHook>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_after: Mutex::new(None),
            write_log: Mutex::new(Vec::new()),
            after_snapshot: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Every trait call so far, reads included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Successful writes as `write_row:N`, `write_cell:R:C`, `append_rows:S+K`
    pub fn write_log(&self) -> Vec<String> {
        self.write_log.lock().clone()
    }

    /// Let `n` more writes through, then reject every write
    pub fn fail_writes_after(&self, n: usize) {
        *self.fail_after.lock() = Some(self.writes.load(Ordering::SeqCst) + n);
    }

    /// Stop failing
    pub fn heal(&self) {
        *self.fail_after.lock() = None;
    }

    /// Run `hook` against the backing sheet right after the next snapshot
    pub fn after_snapshot(&self, hook: impl FnOnce(&MemoryStore) + Send + 'static) {
        *self.after_snapshot.lock() = Some(Box::new(hook));
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        let limit = *self.fail_after.lock();
        if limit.is_some_and(|limit| self.writes.load(Ordering::SeqCst) >= limit) {
            return Err(StoreError::rejected("injected write failure"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn log(&self, entry: String) {
        self.write_log.lock().push(entry);
    }
}

#[async_trait::async_trait]
impl TabularStore for FlakyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn snapshot(&self) -> Result<Grid, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let grid = self.inner.snapshot().await?;
        if let Some(hook) = self.after_snapshot.lock().take() {
            hook(&self.inner);
        }
        Ok(grid)
    }

    async fn read_cell(&self, row: usize, column: usize) -> Result<CellValue, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.read_cell(row, column).await
    }

    async fn write_row(&self, row: usize, values: &[CellValue]) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.begin_write()?;
        self.inner.write_row(row, values).await?;
        self.log(format!("write_row:{row}"));
        Ok(())
    }

    async fn write_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.begin_write()?;
        self.inner.write_cell(row, column, value).await?;
        self.log(format!("write_cell:{row}:{column}"));
        Ok(())
    }

    async fn append_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.begin_write()?;
        self.inner.append_rows(start_row, rows).await?;
        self.log(format!("append_rows:{start_row}+{}", rows.len()));
        Ok(())
    }

    async fn last_row(&self) -> Result<usize, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.last_row().await
    }
}

/// Mail sender that records instead of sending
#[derive(Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    events: Mutex<Vec<String>>,
}

impl RecordingMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message to `recipient`
    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().insert(recipient.to_string());
    }

    /// Hold each send for `delay`
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = delay;
        self
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.to.clone()).collect()
    }

    /// `begin:<to>` / `end:<to>` pairs in the order they happened
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait::async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.events.lock().push(format!("begin:{}", mail.to));
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.events.lock().push(format!("end:{}", mail.to));

        if self.failing.lock().contains(&mail.to) {
            return Err(MailError::Transport(format!("injected failure for {}", mail.to)));
        }
        self.sent.lock().push(mail.clone());
        Ok(())
    }
}

/// [`MemoryDrive`] wrapper with per-document failure injection
#[derive(Default)]
pub struct FaultyDrive {
    inner: MemoryDrive,
    failing_exports: Mutex<HashSet<String>>,
    fail_duplicates: Mutex<bool>,
    failing_saves: AtomicUsize,
}

impl FaultyDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryDrive {
        &self.inner
    }

    /// Fail PDF export of the document called `name`
    pub fn fail_export_for(&self, name: &str) {
        self.failing_exports.lock().insert(name.to_string());
    }

    /// Fail every template duplication
    pub fn fail_duplicates(&self) {
        *self.fail_duplicates.lock() = true;
    }

    /// Fail the next `n` body saves
    pub fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ObjectStore for FaultyDrive {
    async fn find_by_name(
        &self,
        folder: &str,
        name: &str,
    ) -> Result<Option<DocumentHandle>, ObjectStoreError> {
        self.inner.find_by_name(folder, name).await
    }

    async fn duplicate(
        &self,
        template: &DocumentHandle,
        folder: &str,
        name: &str,
    ) -> Result<DocumentHandle, ObjectStoreError> {
        if *self.fail_duplicates.lock() {
            return Err(ObjectStoreError::Rejected("injected duplicate failure".into()));
        }
        self.inner.duplicate(template, folder, name).await
    }

    async fn remove(&self, document: &DocumentHandle) -> Result<(), ObjectStoreError> {
        self.inner.remove(document).await
    }

    async fn export_pdf(&self, document: &DocumentHandle) -> Result<Vec<u8>, ObjectStoreError> {
        if self.failing_exports.lock().contains(&document.name) {
            return Err(ObjectStoreError::export("injected export failure"));
        }
        self.inner.export_pdf(document).await
    }
}

#[async_trait::async_trait]
impl TemplateRenderer for FaultyDrive {
    async fn open_body(&self, document: &DocumentHandle) -> Result<String, ObjectStoreError> {
        self.inner.open_body(document).await
    }

    async fn save_body(&self, document: &DocumentHandle, body: &str) -> Result<(), ObjectStoreError> {
        let remaining = self.failing_saves.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_saves.store(remaining - 1, Ordering::SeqCst);
            return Err(ObjectStoreError::Rejected("injected save failure".into()));
        }
        self.inner.save_body(document, body).await
    }
}
