//! benesync service
//!
//! Hosts the dashboard's ingestion endpoint and drives report delivery,
//! either once from the command line or on a fixed interval while serving.
//!
//! - [`ServiceConfig`]: TOML configuration with environment overrides
//! - [`Service`]: store, drive and mail transport wired together
//! - [`routes`]: `GET /` liveness, `POST /` ingestion
//! - [`run_schedule`]: periodic delivery trigger

#![warn(unreachable_pub)]

pub mod config;
pub mod routes;
pub mod scheduler;
pub mod service;

pub use config::{
    ConfigError, DeliverySection, DriveSection, IngestSection, MailSection, ServerSection,
    ServiceConfig, StoreSection, BIND_ENV, STORE_ENV,
};
pub use routes::{routes, LIVENESS_TEXT};
pub use scheduler::run_schedule;
pub use service::{mail_sender, Service, ServiceError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
