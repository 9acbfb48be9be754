//! The delivery run
//!
//! One run, under the named lock:
//! 1. Snapshot the sheet once and resolve the required columns
//! 2. Walk data rows top to bottom
//! 3. Per row: re-read Status live, skip if already SENT or no Email,
//!    otherwise generate (or reuse) the report, export PDF, send, mark SENT
//!
//! Status is written only after the transport accepted the message, so a
//! crash between send and write can cause one duplicate on the next run but
//! never a lost send.

use crate::error::{DeliveryError, RowError};
use crate::lock::NamedLock;
use crate::mail::{Attachment, MailSender, OutgoingMail};
use benesync_report::ReportGenerator;
use benesync_store::{CellValue, Grid, HeaderRow, TabularStore, ID_COLUMN};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Status value marking a delivered row
pub const SENT_STATUS: &str = "SENT";

/// Default lock name shared by all delivery runs in the process
pub const DEFAULT_LOCK_NAME: &str = "benesync-delivery";

/// Default bound on waiting for the lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

const STATUS_COLUMN: &str = "Status";
const EMAIL_COLUMN: &str = "Email";
const NAME_COLUMN: &str = "Name";

/// Delivery configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Registry name of the run lock
    pub lock_name: String,
    /// How long a run waits for the lock before aborting
    pub lock_timeout: Duration,
    /// File locked alongside the named lock, for exclusion across processes
    pub lock_file: Option<PathBuf>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_file: None,
        }
    }
}

impl DeliveryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set lock name
    #[must_use]
    pub fn with_lock_name(mut self, name: impl Into<String>) -> Self {
        self.lock_name = name.into();
        self
    }

    /// Set lock wait bound
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Also lock `path` for the whole run
    #[must_use]
    pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_file = Some(path.into());
        self
    }
}

/// Resolved 1-based positions of the columns delivery depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryColumns {
    /// `Status`
    pub status: usize,
    /// `Email`
    pub email: usize,
    /// `Name`
    pub name: usize,
    /// `ID`
    pub id: usize,
}

impl DeliveryColumns {
    /// Resolve against a header row
    ///
    /// # Errors
    /// - `DeliveryError::MissingColumns` listing every absent column
    pub fn resolve(header: &HeaderRow) -> Result<Self, DeliveryError> {
        let lookup = [STATUS_COLUMN, EMAIL_COLUMN, NAME_COLUMN, ID_COLUMN].map(|c| (c, header.position(c)));
        let missing: Vec<String> = lookup
            .iter()
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| (*name).to_string())
            .collect();

        match lookup {
            [(_, Some(status)), (_, Some(email)), (_, Some(name)), (_, Some(id))] => Ok(Self {
                status,
                email,
                name,
                id,
            }),
            _ => Err(DeliveryError::MissingColumns(missing)),
        }
    }
}

/// A row that could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// Sheet row, 1-based
    pub row: usize,
    /// Beneficiary ID, possibly empty
    pub id: String,
    /// What went wrong
    pub error: String,
}

/// Outcome of one run, for logging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// IDs sent in this run, in row order
    pub sent: Vec<String>,
    /// Rows skipped because Status was already SENT
    pub already_sent: usize,
    /// Rows skipped because Email was empty
    pub no_email: usize,
    /// Rows that failed; each was logged and left for the next run
    pub failed: Vec<RowFailure>,
    /// Template placeholders naming no sheet column; they render empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched_placeholders: Vec<String>,
}

impl DeliveryReport {
    /// Number of rows looked at
    #[must_use]
    pub fn rows_seen(&self) -> usize {
        self.sent.len() + self.already_sent + self.no_email + self.failed.len()
    }
}

enum RowOutcome {
    Sent,
    AlreadySent,
    NoEmail,
}

/// Subject line for a report mail
#[must_use]
pub fn report_subject(name: &str, id: &str) -> String {
    format!("Health Report for {name} (ID: {id})")
}

/// Body text for a report mail
#[must_use]
pub fn report_body(name: &str, id: &str) -> String {
    let greeting = if name.is_empty() { "Beneficiary" } else { name };
    format!(
        "Dear {greeting},\n\n\
         Please find attached the health report for beneficiary ID {id}.\n\n\
         Regards,\nHealth Monitoring Team\n"
    )
}

/// Report generation and mailing over one sheet
#[derive(Clone)]
pub struct DeliveryWorkflow {
    store: Arc<dyn TabularStore>,
    reports: ReportGenerator,
    mailer: Arc<dyn MailSender>,
    lock: NamedLock,
    config: DeliveryConfig,
}

impl DeliveryWorkflow {
    /// Create workflow with default configuration
    #[must_use]
    pub fn new(
        store: Arc<dyn TabularStore>,
        reports: ReportGenerator,
        mailer: Arc<dyn MailSender>,
    ) -> Self {
        Self::with_config(store, reports, mailer, DeliveryConfig::default())
    }

    /// Create workflow with explicit configuration
    #[must_use]
    pub fn with_config(
        store: Arc<dyn TabularStore>,
        reports: ReportGenerator,
        mailer: Arc<dyn MailSender>,
        config: DeliveryConfig,
    ) -> Self {
        let lock = NamedLock::new(config.lock_name.clone());
        let lock = match &config.lock_file {
            Some(path) => lock.with_file(path.clone()),
            None => lock,
        };
        Self {
            lock,
            store,
            reports,
            mailer,
            config,
        }
    }

    /// The run lock
    #[inline]
    #[must_use]
    pub fn lock(&self) -> &NamedLock {
        &self.lock
    }

    /// Parameterless trigger: run once and log the outcome
    pub async fn trigger(&self) {
        match self.run().await {
            Ok(report) => tracing::info!(
                sent = report.sent.len(),
                already_sent = report.already_sent,
                no_email = report.no_email,
                failed = report.failed.len(),
                "delivery run complete"
            ),
            Err(e) if e.is_lock_timeout() => {
                tracing::warn!(lock = %self.lock.name(), error = %e, "delivery run skipped");
            }
            Err(e) => tracing::warn!(error = %e, "delivery run aborted"),
        }
    }

    /// Run once under the lock
    ///
    /// # Errors
    /// - `DeliveryError::Lock` if the lock was not acquired in time (nothing
    ///   was read or written)
    /// - `DeliveryError::Store` if the snapshot failed
    /// - `DeliveryError::MissingColumns` if Status, Email, Name or ID is absent
    ///
    /// Row failures are not errors; they are collected in the report.
    pub async fn run(&self) -> Result<DeliveryReport, DeliveryError> {
        let _guard = self.lock.acquire(self.config.lock_timeout).await?;
        tracing::info!(lock = %self.lock.name(), sheet = self.store.name(), "delivery run started");

        let snapshot = self.store.snapshot().await?;
        let header = snapshot.header();
        let columns = DeliveryColumns::resolve(&header)?;

        let mut report = DeliveryReport {
            unmatched_placeholders: self.check_template(&header).await,
            ..DeliveryReport::default()
        };
        for (row, _) in snapshot.data_rows() {
            let id = snapshot.cell(row, columns.id).to_trimmed_string();
            match self.deliver_row(&snapshot, &header, columns, row, &id).await {
                Ok(RowOutcome::Sent) => report.sent.push(id),
                Ok(RowOutcome::AlreadySent) => report.already_sent += 1,
                Ok(RowOutcome::NoEmail) => report.no_email += 1,
                Err(e) => {
                    tracing::warn!(row, id = %id, error = %e, "row delivery failed");
                    report.failed.push(RowFailure {
                        row,
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn check_template(&self, header: &HeaderRow) -> Vec<String> {
        match self.reports.unmatched_placeholders(header.names()).await {
            Ok(unmatched) => {
                if !unmatched.is_empty() {
                    tracing::warn!(placeholders = ?unmatched, "template placeholders match no column");
                }
                unmatched
            }
            Err(e) => {
                tracing::debug!(error = %e, "template not checked");
                Vec::new()
            }
        }
    }

    async fn deliver_row(
        &self,
        snapshot: &Grid,
        header: &HeaderRow,
        columns: DeliveryColumns,
        row: usize,
        id: &str,
    ) -> Result<RowOutcome, RowError> {
        let status = self.store.read_cell(row, columns.status).await?;
        if status.to_trimmed_string() == SENT_STATUS {
            tracing::debug!(row, id, "already sent");
            return Ok(RowOutcome::AlreadySent);
        }

        let email = snapshot.cell(row, columns.email).to_trimmed_string();
        if email.is_empty() {
            tracing::debug!(row, id, "no email, skipping");
            return Ok(RowOutcome::NoEmail);
        }
        if id.is_empty() {
            return Err(RowError::MissingId);
        }

        let fields = snapshot.record_at(header, row);
        let report = self.reports.generate(id, &fields).await?;
        let pdf = self.reports.to_pdf(&report).await?;

        let name = snapshot.cell(row, columns.name).to_trimmed_string();
        let mail = OutgoingMail::new(email, report_subject(&name, id), report_body(&name, id))
            .with_attachment(Attachment::pdf(format!("{}.pdf", report.handle.name), pdf));
        self.mailer.send(&mail).await?;

        self.store
            .write_cell(row, columns.status, CellValue::text(SENT_STATUS))
            .await?;
        tracing::info!(row, id, to = %mail.to, reused = report.reused, "report sent");
        Ok(RowOutcome::Sent)
    }
}

impl std::fmt::Debug for DeliveryWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryWorkflow")
            .field("store", &self.store.name())
            .field("reports", &self.reports)
            .field("lock", &self.lock.name())
            .field("config", &self.config)
            .finish()
    }
}
