//! Directory-backed drive
//!
//! A folder is a directory under the drive root and a document is a UTF-8
//! text file named `<name>.txt` inside it. Handle IDs are paths relative to
//! the root, using `/` as the separator.

use crate::drive::{DocumentHandle, ObjectStore, TemplateRenderer};
use crate::error::ObjectStoreError;
use crate::pdf::render_text_pdf;
use std::path::{Component, Path, PathBuf};

const EXTENSION: &str = "txt";

/// Drive rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsDrive {
    root: PathBuf,
}

impl FsDrive {
    /// Create drive over `root`; the directory is created lazily
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Drive root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle for an existing file, given relative to the root
    ///
    /// # Errors
    /// - `ObjectStoreError::InvalidName` if the path escapes the root
    pub fn handle_for(&self, relative: &str) -> Result<DocumentHandle, ObjectStoreError> {
        let path = checked_relative(relative)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(relative)
            .to_string();
        Ok(DocumentHandle::new(relative.replace('\\', "/"), name))
    }

    fn resolve(&self, document: &DocumentHandle) -> Result<PathBuf, ObjectStoreError> {
        Ok(self.root.join(checked_relative(&document.id)?))
    }

    fn document_id(folder: &str, name: &str) -> Result<String, ObjectStoreError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ObjectStoreError::InvalidName(name.to_string()));
        }
        let folder = folder.trim_matches('/');
        checked_relative(folder)?;
        Ok(if folder.is_empty() {
            format!("{name}.{EXTENSION}")
        } else {
            format!("{folder}/{name}.{EXTENSION}")
        })
    }

    async fn read(&self, document: &DocumentHandle) -> Result<String, ObjectStoreError> {
        let path = self.resolve(document)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ObjectStoreError::io_error(path, e))
    }
}

/// Reject absolute paths and parent-directory hops
fn checked_relative(relative: &str) -> Result<PathBuf, ObjectStoreError> {
    let path = PathBuf::from(relative);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ObjectStoreError::InvalidName(relative.to_string()));
    }
    Ok(path)
}

#[async_trait::async_trait]
impl ObjectStore for FsDrive {
    async fn find_by_name(
        &self,
        folder: &str,
        name: &str,
    ) -> Result<Option<DocumentHandle>, ObjectStoreError> {
        let handle = DocumentHandle::new(Self::document_id(folder, name)?, name);
        let path = self.resolve(&handle)?;
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(Some(handle)),
            Ok(false) => Ok(None),
            Err(e) => Err(ObjectStoreError::io_error(path, e)),
        }
    }

    async fn duplicate(
        &self,
        template: &DocumentHandle,
        folder: &str,
        name: &str,
    ) -> Result<DocumentHandle, ObjectStoreError> {
        let source = self.resolve(template)?;
        let handle = DocumentHandle::new(Self::document_id(folder, name)?, name);
        let target = self.resolve(&handle)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ObjectStoreError::io_error(parent, e))?;
        }
        tokio::fs::copy(&source, &target)
            .await
            .map_err(|e| ObjectStoreError::io_error(&source, e))?;

        tracing::debug!(from = %source.display(), to = %target.display(), "duplicated template");
        Ok(handle)
    }

    async fn remove(&self, document: &DocumentHandle) -> Result<(), ObjectStoreError> {
        let path = self.resolve(document)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ObjectStoreError::io_error(path, e)),
        }
    }

    async fn export_pdf(&self, document: &DocumentHandle) -> Result<Vec<u8>, ObjectStoreError> {
        let body = self.read(document).await?;
        render_text_pdf(&document.name, &body)
    }
}

#[async_trait::async_trait]
impl TemplateRenderer for FsDrive {
    async fn open_body(&self, document: &DocumentHandle) -> Result<String, ObjectStoreError> {
        self.read(document).await
    }

    async fn save_body(&self, document: &DocumentHandle, body: &str) -> Result<(), ObjectStoreError> {
        let path = self.resolve(document)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| ObjectStoreError::io_error(path, e))
    }
}
