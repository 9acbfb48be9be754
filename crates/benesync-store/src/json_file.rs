//! JSON-file store backend
//!
//! The whole sheet lives in one JSON document. Every mutation rewrites the
//! document through a temporary file followed by a rename, so a crash never
//! leaves a half-written sheet behind.
//!
//! Nothing is cached between calls: every operation reads the file again
//! while holding an OS lock on a sidecar `<file>.lock`, shared for reads and
//! exclusive for read-modify-write. Several processes may open the same
//! path; each one sees the others' writes and never overwrites them with a
//! stale copy.

use crate::error::StoreError;
use crate::grid::Grid;
use crate::store::{check_address, TabularStore};
use crate::value::CellValue;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct SheetDocument {
    name: String,
    grid: Grid,
}

#[derive(Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Held OS lock on the sidecar file; unlocked on drop
struct SheetLock {
    file: File,
}

impl Drop for SheetLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Sheet persisted as a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    name: String,
    path: PathBuf,
    lock_path: PathBuf,
    writer: Mutex<()>,
}

impl JsonFileStore {
    /// Open the sheet at `path`; a missing file is an empty sheet, created
    /// on the first write
    ///
    /// # Errors
    /// - `StoreError::Io` if the file exists but cannot be read
    /// - `StoreError::Codec` if the file is not a sheet document
    pub async fn open(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        let store = Self {
            name: name.into(),
            lock_path: PathBuf::from(lock_path),
            path,
            writer: Mutex::new(()),
        };

        let _lock = store.lock(LockMode::Shared).await?;
        if store.load().await?.is_none() {
            tracing::info!(path = %store.path.display(), "sheet file absent, starting empty");
        }
        Ok(store)
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn lock(&self, mode: LockMode) -> Result<SheetLock, StoreError> {
        let path = self.lock_path.clone();
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| StoreError::io_error(&path, e))?;
            match mode {
                LockMode::Shared => FileExt::lock_shared(&file),
                LockMode::Exclusive => FileExt::lock_exclusive(&file),
            }
            .map_err(|e| StoreError::io_error(&path, e))?;
            Ok(SheetLock { file })
        })
        .await
        .map_err(|e| StoreError::Rejected(format!("sheet lock task failed: {e}")))?
    }

    /// Current file contents; `None` when the file does not exist yet
    async fn load(&self) -> Result<Option<Grid>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice::<SheetDocument>(&bytes)?.grid)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io_error(&self.path, e)),
        }
    }

    async fn read(&self) -> Result<Grid, StoreError> {
        let _lock = self.lock(LockMode::Shared).await?;
        Ok(self.load().await?.unwrap_or_default())
    }

    /// Reload, apply a mutation and persist, all under the exclusive lock
    async fn mutate(&self, f: impl FnOnce(&mut Grid)) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let _lock = self.lock(LockMode::Exclusive).await?;
        let mut grid = self.load().await?.unwrap_or_default();
        f(&mut grid);
        self.persist(grid).await
    }

    async fn persist(&self, grid: Grid) -> Result<(), StoreError> {
        let doc = SheetDocument {
            name: self.name.clone(),
            grid,
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io_error(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io_error(&self.path, e))
    }
}

#[async_trait::async_trait]
impl TabularStore for JsonFileStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn snapshot(&self) -> Result<Grid, StoreError> {
        self.read().await
    }

    async fn read_cell(&self, row: usize, column: usize) -> Result<CellValue, StoreError> {
        check_address(row, column)?;
        Ok(self.read().await?.cell(row, column).clone())
    }

    async fn write_row(&self, row: usize, values: &[CellValue]) -> Result<(), StoreError> {
        check_address(row, 1)?;
        self.mutate(|g| g.set_row(row, values)).await
    }

    async fn write_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), StoreError> {
        check_address(row, column)?;
        self.mutate(|g| g.set_cell(row, column, value)).await
    }

    async fn append_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), StoreError> {
        check_address(start_row, 1)?;
        self.mutate(|g| g.set_rows(start_row, rows)).await
    }

    async fn last_row(&self) -> Result<usize, StoreError> {
        Ok(self.read().await?.last_row())
    }
}
