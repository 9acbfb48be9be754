//! Object store and template renderer capabilities

use crate::error::ObjectStoreError;
use std::fmt;

/// Reference to a stored document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle {
    /// Backend identifier (opaque to callers)
    pub id: String,
    /// Display name, unique within its folder
    pub name: String,
}

impl DocumentHandle {
    /// Create handle
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Where generated documents live
///
/// Lookup by name is scoped to one folder. Names are not required to be
/// unique by the backend; when several match, the first found wins.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Find a document in `folder` by exact name
    async fn find_by_name(
        &self,
        folder: &str,
        name: &str,
    ) -> Result<Option<DocumentHandle>, ObjectStoreError>;

    /// Copy `template` into `folder` under `name`
    async fn duplicate(
        &self,
        template: &DocumentHandle,
        folder: &str,
        name: &str,
    ) -> Result<DocumentHandle, ObjectStoreError>;

    /// Delete a document; deleting one that is already gone is not an error
    async fn remove(&self, document: &DocumentHandle) -> Result<(), ObjectStoreError>;

    /// Render the document as PDF bytes, fresh on every call
    async fn export_pdf(&self, document: &DocumentHandle) -> Result<Vec<u8>, ObjectStoreError>;
}

/// Read/write access to a document body
#[async_trait::async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Current body text
    async fn open_body(&self, document: &DocumentHandle) -> Result<String, ObjectStoreError>;

    /// Replace the body text
    async fn save_body(&self, document: &DocumentHandle, body: &str) -> Result<(), ObjectStoreError>;
}
