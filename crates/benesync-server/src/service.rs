//! Wiring from configuration to running components

use crate::config::{ConfigError, MailSection, ServiceConfig};
use benesync_delivery::{
    DeliveryConfig, DeliveryWorkflow, HttpMailRelay, MailSender, NamedLock, OutboxMailSender,
};
use benesync_ingest::{IngestResponse, Ingestor};
use benesync_report::{FsDrive, ObjectStoreError, ReportGenerator};
use benesync_store::{JsonFileStore, StoreError, TabularStore};
use std::sync::Arc;

/// Errors building the service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Sheet file could not be opened
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),

    /// Template path is not usable on the drive
    #[error("drive misconfigured: {0}")]
    Drive(#[from] ObjectStoreError),
}

/// Transport selected by `[mail]`
#[must_use]
pub fn mail_sender(mail: &MailSection) -> Arc<dyn MailSender> {
    match mail {
        MailSection::Outbox { dir } => Arc::new(OutboxMailSender::new(dir.clone())),
        MailSection::Relay { url, from } => Arc::new(HttpMailRelay::new(url.clone(), from.clone())),
    }
}

/// Ingestion and delivery over one configured sheet
#[derive(Debug, Clone)]
pub struct Service {
    config: ServiceConfig,
    ingestor: Ingestor,
    workflow: DeliveryWorkflow,
    ingest_lock: Option<NamedLock>,
}

impl Service {
    /// Open the JSON store named in the config and wire everything to it
    ///
    /// Delivery runs also lock [`ServiceConfig::delivery_lock_file`], so a
    /// `deliver` command and a serving process on the same store never run
    /// at the same time.
    ///
    /// # Errors
    /// - `ServiceError::Store` if the store file exists but cannot be read
    /// - `ServiceError::Drive` if the template path escapes the drive root
    pub async fn from_config(config: ServiceConfig) -> Result<Self, ServiceError> {
        let store = JsonFileStore::open(&config.store.path, config.store.sheet.clone()).await?;
        let lock_file = config.delivery_lock_file();
        Self::with_store(config.with_lock_file(lock_file), Arc::new(store))
    }

    /// Wire the configured drive and mail transport around `store`
    ///
    /// The delivery lock is file-backed only when `delivery.lock_file` is set.
    ///
    /// # Errors
    /// - `ServiceError::Drive` if the template path escapes the drive root
    pub fn with_store(
        config: ServiceConfig,
        store: Arc<dyn TabularStore>,
    ) -> Result<Self, ServiceError> {
        let drive = Arc::new(FsDrive::new(config.drive.root.clone()));
        let template = drive.handle_for(&config.drive.template)?;
        let reports = ReportGenerator::with_drive(drive, template, config.drive.folder.clone());

        let mut delivery = DeliveryConfig::new()
            .with_lock_name(config.delivery.lock_name.clone())
            .with_lock_timeout(config.delivery.lock_timeout());
        if let Some(path) = &config.delivery.lock_file {
            delivery = delivery.with_lock_file(path.clone());
        }
        let workflow = DeliveryWorkflow::with_config(
            store.clone(),
            reports,
            mail_sender(&config.mail),
            delivery,
        );

        let ingest_lock = config
            .ingest
            .serialize_with_delivery_lock
            .then(|| workflow.lock().clone());

        tracing::info!(
            sheet = store.name(),
            drive = %config.drive.root.display(),
            ingest_locked = ingest_lock.is_some(),
            "service ready"
        );

        Ok(Self {
            ingestor: Ingestor::new(store),
            workflow,
            ingest_lock,
            config,
        })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Delivery workflow
    #[inline]
    #[must_use]
    pub fn workflow(&self) -> &DeliveryWorkflow {
        &self.workflow
    }

    /// Ingest one request body
    ///
    /// With `ingest.serialize_with_delivery_lock` set, the batch runs under
    /// the delivery lock; failing to get it in time is an error response and
    /// the store is not touched.
    pub async fn ingest(&self, body: &[u8]) -> IngestResponse {
        let _guard = match &self.ingest_lock {
            Some(lock) => match lock.acquire(self.config.delivery.lock_timeout()).await {
                Ok(guard) => Some(guard),
                Err(e) => {
                    tracing::warn!(lock = %lock.name(), error = %e, "batch not ingested");
                    return IngestResponse::error(e.to_string());
                }
            },
            None => None,
        };
        self.ingestor.ingest_json(body).await
    }
}
