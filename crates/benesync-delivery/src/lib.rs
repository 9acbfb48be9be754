//! Delivery Workflow
//!
//! Sends each beneficiary their report exactly once: the "Status" column
//! doubles as the idempotency marker, and a process-wide [`NamedLock`]
//! keeps two runs from working the sheet at the same time.
//!
//! - [`DeliveryWorkflow`]: the locked, top-to-bottom run
//! - [`MailSender`]: transport capability, with [`OutboxMailSender`] and
//!   [`HttpMailRelay`]
//! - [`NamedLock`]: bounded-wait lock with a releasing guard
//!
//! # Example
//!
//! ```rust,ignore
//! use benesync_delivery::{DeliveryWorkflow, OutboxMailSender};
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<dyn benesync_store::TabularStore>, reports: benesync_report::ReportGenerator) {
//! let workflow = DeliveryWorkflow::new(store, reports, Arc::new(OutboxMailSender::new("outbox")));
//! workflow.trigger().await;
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod lock;
pub mod mail;
pub mod outbox;
pub mod relay;
pub mod workflow;

pub use error::{DeliveryError, LockError, MailError, RowError};
pub use lock::{LockGuard, NamedLock};
pub use mail::{Attachment, MailSender, OutgoingMail};
pub use outbox::OutboxMailSender;
pub use relay::HttpMailRelay;
pub use workflow::{
    report_body, report_subject, DeliveryColumns, DeliveryConfig, DeliveryReport, DeliveryWorkflow,
    RowFailure, DEFAULT_LOCK_NAME, DEFAULT_LOCK_TIMEOUT, SENT_STATUS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
