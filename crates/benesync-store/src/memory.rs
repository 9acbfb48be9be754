//! In-process store backend

use crate::error::StoreError;
use crate::grid::Grid;
use crate::store::{check_address, TabularStore};
use crate::value::CellValue;
use parking_lot::RwLock;

/// Sheet held in memory
///
/// `None` models a sheet that does not exist; every call then fails with
/// [`StoreError::SheetMissing`].
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    grid: RwLock<Option<Grid>>,
}

impl MemoryStore {
    /// Create an empty, existing sheet
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_grid(name, Grid::default())
    }

    /// Create a sheet with initial contents
    #[inline]
    #[must_use]
    pub fn with_grid(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid: RwLock::new(Some(grid)),
        }
    }

    /// Create a handle to a sheet that does not exist
    #[inline]
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grid: RwLock::new(None),
        }
    }

    /// Current contents, bypassing the async interface
    #[must_use]
    pub fn grid(&self) -> Option<Grid> {
        self.grid.read().clone()
    }

    /// Mutate contents in place, bypassing the async interface. Returns
    /// false for a missing sheet.
    pub fn edit(&self, f: impl FnOnce(&mut Grid)) -> bool {
        self.grid.write().as_mut().map(f).is_some()
    }

    fn read<T>(&self, f: impl FnOnce(&Grid) -> T) -> Result<T, StoreError> {
        self.grid
            .read()
            .as_ref()
            .map(f)
            .ok_or_else(|| StoreError::SheetMissing(self.name.clone()))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Grid) -> T) -> Result<T, StoreError> {
        self.grid
            .write()
            .as_mut()
            .map(f)
            .ok_or_else(|| StoreError::SheetMissing(self.name.clone()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}

#[async_trait::async_trait]
impl TabularStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn snapshot(&self) -> Result<Grid, StoreError> {
        self.read(Clone::clone)
    }

    async fn read_cell(&self, row: usize, column: usize) -> Result<CellValue, StoreError> {
        check_address(row, column)?;
        self.read(|g| g.cell(row, column).clone())
    }

    async fn write_row(&self, row: usize, values: &[CellValue]) -> Result<(), StoreError> {
        check_address(row, 1)?;
        self.write(|g| g.set_row(row, values))
    }

    async fn write_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), StoreError> {
        check_address(row, column)?;
        self.write(|g| g.set_cell(row, column, value))
    }

    async fn append_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), StoreError> {
        check_address(start_row, 1)?;
        self.write(|g| g.set_rows(start_row, rows))
    }

    async fn last_row(&self) -> Result<usize, StoreError> {
        self.read(Grid::last_row)
    }
}
