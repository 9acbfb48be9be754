//! Report Generator
//!
//! Turns one record into a named document by duplicating a template and
//! filling its `{{Column}}` placeholders, then exports it as PDF on demand.
//!
//! The backend is split into two capabilities, [`ObjectStore`] (lookup,
//! duplication, export) and [`TemplateRenderer`] (body access), with an
//! in-memory ([`MemoryDrive`]) and a directory ([`FsDrive`]) implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use benesync_report::{MemoryDrive, ReportGenerator};
//! use benesync_store::Record;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), benesync_report::ReportError> {
//! let drive = Arc::new(MemoryDrive::new());
//! let template = drive.put("templates", "Template", "Dear {{Name}}");
//! let generator = ReportGenerator::with_drive(drive, template, "reports");
//!
//! let report = generator.generate("7", &Record::new().with("Name", "Asha")).await?;
//! let pdf = generator.to_pdf(&report).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod drive;
pub mod error;
pub mod fs;
pub mod generator;
pub mod memory;
pub mod pdf;
pub mod placeholder;

pub use drive::{DocumentHandle, ObjectStore, TemplateRenderer};
pub use error::{ObjectStoreError, ReportError};
pub use fs::FsDrive;
pub use generator::{report_name, Report, ReportGenerator};
pub use memory::MemoryDrive;
pub use pdf::render_text_pdf;
pub use placeholder::{placeholder_names, substitute_placeholders};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
