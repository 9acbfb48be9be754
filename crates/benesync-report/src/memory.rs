//! In-process drive backend

use crate::drive::{DocumentHandle, ObjectStore, TemplateRenderer};
use crate::error::ObjectStoreError;
use crate::pdf::render_text_pdf;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct StoredDocument {
    folder: String,
    name: String,
    body: String,
}

/// Documents held in memory, keyed by generated ID
#[derive(Debug, Default)]
pub struct MemoryDrive {
    documents: RwLock<BTreeMap<String, StoredDocument>>,
    next_id: AtomicU64,
    duplicates: AtomicUsize,
    exports: AtomicUsize,
}

impl MemoryDrive {
    /// Create empty drive
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document directly, bypassing duplication
    pub fn put(&self, folder: &str, name: &str, body: &str) -> DocumentHandle {
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.documents.write().insert(
            id.clone(),
            StoredDocument {
                folder: folder.to_string(),
                name: name.to_string(),
                body: body.to_string(),
            },
        );
        DocumentHandle::new(id, name)
    }

    /// Body of a document
    #[must_use]
    pub fn body(&self, document: &DocumentHandle) -> Option<String> {
        self.documents.read().get(&document.id).map(|d| d.body.clone())
    }

    /// Documents in `folder`, in creation order
    #[must_use]
    pub fn list(&self, folder: &str) -> Vec<DocumentHandle> {
        let documents = self.documents.read();
        let mut found: Vec<(u64, DocumentHandle)> = documents
            .iter()
            .filter(|(_, d)| d.folder == folder)
            .map(|(id, d)| (sequence(id), DocumentHandle::new(id.as_str(), d.name.as_str())))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Number of successful `duplicate` calls
    #[inline]
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.load(Ordering::Relaxed)
    }

    /// Number of successful `export_pdf` calls
    #[inline]
    #[must_use]
    pub fn export_count(&self) -> usize {
        self.exports.load(Ordering::Relaxed)
    }

    fn get(&self, document: &DocumentHandle) -> Result<StoredDocument, ObjectStoreError> {
        self.documents
            .read()
            .get(&document.id)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(document.to_string()))
    }
}

fn sequence(id: &str) -> u64 {
    id.trim_start_matches("doc-").parse().unwrap_or(u64::MAX)
}

#[async_trait::async_trait]
impl ObjectStore for MemoryDrive {
    async fn find_by_name(
        &self,
        folder: &str,
        name: &str,
    ) -> Result<Option<DocumentHandle>, ObjectStoreError> {
        Ok(self.list(folder).into_iter().find(|d| d.name == name))
    }

    async fn duplicate(
        &self,
        template: &DocumentHandle,
        folder: &str,
        name: &str,
    ) -> Result<DocumentHandle, ObjectStoreError> {
        let source = self.get(template)?;
        let handle = self.put(folder, name, &source.body);
        self.duplicates.fetch_add(1, Ordering::Relaxed);
        Ok(handle)
    }

    async fn remove(&self, document: &DocumentHandle) -> Result<(), ObjectStoreError> {
        self.documents.write().remove(&document.id);
        Ok(())
    }

    async fn export_pdf(&self, document: &DocumentHandle) -> Result<Vec<u8>, ObjectStoreError> {
        let stored = self.get(document)?;
        let bytes = render_text_pdf(&stored.name, &stored.body)?;
        self.exports.fetch_add(1, Ordering::Relaxed);
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl TemplateRenderer for MemoryDrive {
    async fn open_body(&self, document: &DocumentHandle) -> Result<String, ObjectStoreError> {
        self.get(document).map(|d| d.body)
    }

    async fn save_body(&self, document: &DocumentHandle, body: &str) -> Result<(), ObjectStoreError> {
        let mut documents = self.documents.write();
        let stored = documents
            .get_mut(&document.id)
            .ok_or_else(|| ObjectStoreError::NotFound(document.to_string()))?;
        stored.body = body.to_string();
        Ok(())
    }
}
