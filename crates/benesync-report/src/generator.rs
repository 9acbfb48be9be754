//! Report generation state machine
//!
//! `NOT_GENERATED → lookup by deterministic name → EXISTS (reuse) | ABSENT
//! (duplicate, substitute, save)`. Reuse never re-renders, so a report built
//! from older field values stays as it was.
//!
//! A copy that could not be rendered is removed again, so a later run never
//! finds and reuses a document still holding raw placeholders.

use crate::drive::{DocumentHandle, ObjectStore, TemplateRenderer};
use crate::error::{ObjectStoreError, ReportError};
use crate::placeholder::{placeholder_names, substitute_placeholders};
use benesync_store::Record;
use std::sync::Arc;

/// Deterministic report name for an ID
#[inline]
#[must_use]
pub fn report_name(id: &str) -> String {
    format!("{}_Report", id.trim())
}

/// A report ready for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Document in the reports folder
    pub handle: DocumentHandle,
    /// True when an existing document was returned unchanged
    pub reused: bool,
}

/// Builds per-record reports from one template into one folder
#[derive(Clone)]
pub struct ReportGenerator {
    objects: Arc<dyn ObjectStore>,
    renderer: Arc<dyn TemplateRenderer>,
    template: DocumentHandle,
    folder: String,
}

impl ReportGenerator {
    /// Create generator from separate capabilities
    #[must_use]
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        renderer: Arc<dyn TemplateRenderer>,
        template: DocumentHandle,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            objects,
            renderer,
            template,
            folder: folder.into(),
        }
    }

    /// Create generator over a backend that provides both capabilities
    #[must_use]
    pub fn with_drive<D>(drive: Arc<D>, template: DocumentHandle, folder: impl Into<String>) -> Self
    where
        D: ObjectStore + TemplateRenderer + 'static,
    {
        Self::new(drive.clone(), drive, template, folder)
    }

    /// Folder reports are written to
    #[inline]
    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Return the report for `id`, generating it if absent
    ///
    /// # Errors
    /// - `ReportError::MissingId` for a blank ID
    /// - `ReportError::ObjectStore` if lookup, duplication, open or save fails
    pub async fn generate(&self, id: &str, fields: &Record) -> Result<Report, ReportError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ReportError::MissingId);
        }
        let name = report_name(id);

        if let Some(handle) = self.objects.find_by_name(&self.folder, &name).await? {
            tracing::debug!(id, report = %handle, "reusing existing report");
            return Ok(Report {
                handle,
                reused: true,
            });
        }

        let handle = self
            .objects
            .duplicate(&self.template, &self.folder, &name)
            .await?;
        if let Err(e) = self.render(&handle, fields).await {
            if let Err(cleanup) = self.objects.remove(&handle).await {
                tracing::warn!(id, report = %handle, error = %cleanup, "unrendered report left behind");
            }
            return Err(e.into());
        }

        tracing::info!(id, report = %handle, "generated report");
        Ok(Report {
            handle,
            reused: false,
        })
    }

    async fn render(&self, handle: &DocumentHandle, fields: &Record) -> Result<(), ObjectStoreError> {
        let body = self.renderer.open_body(handle).await?;
        self.renderer
            .save_body(handle, &substitute_placeholders(&body, fields))
            .await
    }

    /// Template placeholders that name none of `columns`
    ///
    /// They render as empty text in every report.
    ///
    /// # Errors
    /// - `ReportError::ObjectStore` if the template cannot be opened
    pub async fn unmatched_placeholders(&self, columns: &[String]) -> Result<Vec<String>, ReportError> {
        let body = self.renderer.open_body(&self.template).await?;
        Ok(placeholder_names(&body)
            .into_iter()
            .filter(|name| !columns.iter().any(|c| c.trim() == name.as_str()))
            .collect())
    }

    /// Export a report as PDF bytes
    ///
    /// # Errors
    /// - `ReportError::ObjectStore` if conversion fails
    pub async fn to_pdf(&self, report: &Report) -> Result<Vec<u8>, ReportError> {
        Ok(self.objects.export_pdf(&report.handle).await?)
    }
}

impl std::fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerator")
            .field("template", &self.template)
            .field("folder", &self.folder)
            .finish()
    }
}
