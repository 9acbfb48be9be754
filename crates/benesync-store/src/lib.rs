//! Tabular Store Adapter
//!
//! A spreadsheet-shaped store: row 1 holds the headers, every following row
//! holds one record's values aligned to the header order at write time.
//!
//! - [`CellValue`] / [`Record`]: the scalar and record model
//! - [`Grid`] / [`HeaderRow`]: point-in-time snapshot of the sheet
//! - [`TabularStore`]: the async capability both workflows consume
//! - [`MemoryStore`] and [`JsonFileStore`]: the two backends
//!
//! Rows and columns are 1-indexed at the store boundary, matching the
//! spreadsheet convention.
//!
//! # Example
//!
//! ```rust,ignore
//! use benesync_store::{MemoryStore, TabularStore, CellValue};
//!
//! # async fn example() -> Result<(), benesync_store::StoreError> {
//! let store = MemoryStore::new("Sheet1");
//! store.write_row(1, &["ID".into(), "Name".into()]).await?;
//! store.append_rows(2, &[vec!["1".into(), "Asha".into()]]).await?;
//! assert_eq!(store.last_row().await?, 2);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod grid;
pub mod json_file;
pub mod memory;
pub mod store;
pub mod value;

pub use error::StoreError;
pub use grid::{Grid, HeaderRow};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use store::{TabularStore, HEADER_ROW};
pub use value::{CellValue, Record, ID_COLUMN};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
