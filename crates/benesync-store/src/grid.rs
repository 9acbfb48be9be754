//! Grid snapshots and the header row

use crate::value::{CellValue, Record};
use serde::{Deserialize, Serialize};

/// Ordered column names, trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRow(Vec<String>);

impl HeaderRow {
    /// Create header row from names (each trimmed)
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|n| n.as_ref().trim().to_string()).collect())
    }

    /// 1-based column of `name`, compared after trimming (case-sensitive)
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.0.iter().position(|h| h == name).map(|i| i + 1)
    }

    /// Check if header is present
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Append a column name (trimmed)
    pub fn push(&mut self, name: &str) {
        self.0.push(name.trim().to_string());
    }

    /// Column names in order
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of columns
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no header has been established
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Header as a row of cells, ready to write to row 1
    #[must_use]
    pub fn to_cells(&self) -> Vec<CellValue> {
        self.0.iter().map(|n| CellValue::text(n.as_str())).collect()
    }
}

/// Point-in-time contents of a sheet
///
/// Row `n` of the sheet is `rows[n - 1]`. Rows may be ragged; missing cells
/// read as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// Create grid from raw rows (row 1 first)
    #[inline]
    #[must_use]
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Header row, or an empty header for an empty sheet
    #[must_use]
    pub fn header(&self) -> HeaderRow {
        self.rows
            .first()
            .map(|row| HeaderRow::new(row.iter().map(CellValue::to_trimmed_string)))
            .unwrap_or_default()
    }

    /// Last row containing at least one non-empty cell (0 when empty)
    #[must_use]
    pub fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|c| *c != CellValue::Empty))
            .map_or(0, |i| i + 1)
    }

    /// True when nothing has ever been written
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_row() == 0
    }

    /// Row by 1-based number
    #[must_use]
    pub fn row(&self, number: usize) -> Option<&[CellValue]> {
        number.checked_sub(1).and_then(|i| self.rows.get(i)).map(Vec::as_slice)
    }

    /// Cell by 1-based row and column; out-of-range reads are empty
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.row(row)
            .and_then(|r| column.checked_sub(1).and_then(|c| r.get(c)))
            .unwrap_or(&EMPTY)
    }

    /// Data rows (everything below the header) with their row numbers
    #[must_use]
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[CellValue])> {
        let last = self.last_row();
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .take(last.saturating_sub(1))
            .map(|(i, row)| (i + 1, row.as_slice()))
    }

    /// Overwrite cells of `row` starting at column 1; cells past
    /// `values.len()` keep their contents
    pub fn set_row(&mut self, row: usize, values: &[CellValue]) {
        let slot = self.slot_mut(row);
        if slot.len() < values.len() {
            slot.resize(values.len(), CellValue::Empty);
        }
        slot[..values.len()].clone_from_slice(values);
    }

    /// Overwrite a single cell
    pub fn set_cell(&mut self, row: usize, column: usize, value: CellValue) {
        let slot = self.slot_mut(row);
        if slot.len() < column {
            slot.resize(column, CellValue::Empty);
        }
        slot[column - 1] = value;
    }

    /// Write a contiguous block of rows starting at `start_row`
    pub fn set_rows(&mut self, start_row: usize, rows: &[Vec<CellValue>]) {
        for (offset, values) in rows.iter().enumerate() {
            self.set_row(start_row + offset, values);
        }
    }

    /// Field mapping for one data row, keyed by `header`
    ///
    /// Columns past the end of the row map to empty cells. Duplicate header
    /// names keep the rightmost value.
    #[must_use]
    pub fn record_at(&self, header: &HeaderRow, row: usize) -> Record {
        header
            .names()
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| (name, self.cell(row, i + 1).clone()))
            .collect()
    }

    /// Raw rows (row 1 first)
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    fn slot_mut(&mut self, row: usize) -> &mut Vec<CellValue> {
        debug_assert!(row >= 1, "rows are 1-indexed");
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        &mut self.rows[row - 1]
    }
}
