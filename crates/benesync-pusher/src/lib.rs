//! Dashboard sync client
//!
//! Keeps the sheet up to date from the dashboard side without resending
//! everything: each pushed record's signature is remembered per ID, and only
//! new or changed records go out. The cache commits only after the endpoint
//! confirms, so a failed push is simply repeated next time.

#![warn(unreachable_pub)]

pub mod cache;
pub mod client;
pub mod error;

pub use cache::{row_signature, SignatureCache};
pub use client::{diff, PushOutcome, SyncClient, SyncDiff, PUSH_TIMEOUT};
pub use error::PushError;

/// Columns pushed by default, in payload order
pub const DEFAULT_SYNC_COLUMNS: &[&str] = &[
    "SL.NO",
    "ID",
    "enrollment_date",
    "Area Code",
    "PSU Name",
    "Name",
    "Gender",
    "Benificiery",
    "HGB",
    "anemia_category",
    "Length",
    "Height",
    "Weight",
    "Age",
    "whatsapp",
    "Diet 1",
    "Diet 2",
    "field_investigator",
    "Asha_Worker",
    "data_operator",
    "Sample Collected Date",
    "bmi_category",
    "BMI",
    "Email",
    "Status",
];

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
