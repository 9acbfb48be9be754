//! The tabular store capability

use crate::error::StoreError;
use crate::grid::Grid;
use crate::value::CellValue;
use std::sync::Arc;

/// Row holding the column names
pub const HEADER_ROW: usize = 1;

/// Read/write access to one sheet
///
/// Every method is a single store call; the store guarantees per-call
/// atomicity only. Nothing here is transactional across calls.
#[async_trait::async_trait]
pub trait TabularStore: Send + Sync {
    /// Sheet name, for logging
    fn name(&self) -> &str;

    /// Full contents of the sheet
    async fn snapshot(&self) -> Result<Grid, StoreError>;

    /// Live value of one cell
    async fn read_cell(&self, row: usize, column: usize) -> Result<CellValue, StoreError>;

    /// Overwrite `row` starting at column 1
    async fn write_row(&self, row: usize, values: &[CellValue]) -> Result<(), StoreError>;

    /// Overwrite one cell
    async fn write_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), StoreError>;

    /// Write `rows` as one contiguous block beginning at `start_row`
    async fn append_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), StoreError>;

    /// Last non-empty row, 0 for an empty sheet
    async fn last_row(&self) -> Result<usize, StoreError>;
}

#[async_trait::async_trait]
impl<T: TabularStore + ?Sized> TabularStore for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn snapshot(&self) -> Result<Grid, StoreError> {
        (**self).snapshot().await
    }

    async fn read_cell(&self, row: usize, column: usize) -> Result<CellValue, StoreError> {
        (**self).read_cell(row, column).await
    }

    async fn write_row(&self, row: usize, values: &[CellValue]) -> Result<(), StoreError> {
        (**self).write_row(row, values).await
    }

    async fn write_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), StoreError> {
        (**self).write_cell(row, column, value).await
    }

    async fn append_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), StoreError> {
        (**self).append_rows(start_row, rows).await
    }

    async fn last_row(&self) -> Result<usize, StoreError> {
        (**self).last_row().await
    }
}

/// Reject row/column 0
pub(crate) fn check_address(row: usize, column: usize) -> Result<(), StoreError> {
    if row == 0 || column == 0 {
        return Err(StoreError::OutOfBounds { row, column });
    }
    Ok(())
}
