//! Per-ID row signatures of what was last pushed

use crate::error::PushError;
use benesync_store::Record;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Signature of a record over `columns`
///
/// Every column takes part as its trimmed string value, an absent field as
/// the empty string, joined with `|` and hashed with SHA-256 (hex).
#[must_use]
pub fn row_signature(record: &Record, columns: &[String]) -> String {
    let joined = columns
        .iter()
        .map(|c| record.get_or_empty(c).to_trimmed_string())
        .collect::<Vec<_>>()
        .join("|");
    hex::encode(Sha256::digest(joined.as_bytes()))
}

/// ID → signature map, optionally backed by a JSON file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl SignatureCache {
    /// In-memory cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`
    ///
    /// A missing or unreadable file yields an empty cache bound to the same
    /// path, so the next successful push rewrites it.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "sync cache corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "sync cache unreadable, starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    /// Backing file, if any
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Signature stored for `id`
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Record a signature
    pub fn insert(&mut self, id: impl Into<String>, signature: impl Into<String>) {
        self.entries.insert(id.into(), signature.into());
    }

    /// Number of IDs tracked
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been pushed yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write to the backing file; a no-op for an in-memory cache
    ///
    /// # Errors
    /// - `PushError::Io` if the file cannot be written
    pub async fn save(&self) -> Result<(), PushError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PushError::io_error(parent, e))?;
        }
        let bytes = serde_json::to_vec(&self.entries)?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| PushError::io_error(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn signature_ignores_whitespace_and_unsynced_columns() {
        let cols = columns(&["ID", "Name", "HGB"]);
        let a = Record::new().with("ID", "7").with("Name", " Asha ");
        let b = Record::new().with("ID", "7").with("Name", "Asha").with("Other", "x");
        assert_eq!(row_signature(&a, &cols), row_signature(&b, &cols));
        assert_eq!(row_signature(&a, &cols).len(), 64);
    }

    #[test]
    fn absent_field_keeps_its_position() {
        let cols = columns(&["ID", "Name", "HGB"]);
        let name_only = Record::new().with("ID", "7").with("Name", "x");
        let hgb_only = Record::new().with("ID", "7").with("HGB", "x");
        let blank_hgb = Record::new().with("ID", "7").with("Name", "x").with("HGB", "");

        assert_ne!(row_signature(&name_only, &cols), row_signature(&hgb_only, &cols));
        assert_eq!(row_signature(&name_only, &cols), row_signature(&blank_hgb, &cols));
    }

    #[test]
    fn signature_changes_with_value() {
        let cols = columns(&["ID", "HGB"]);
        let a = Record::new().with("ID", "7").with("HGB", 10.5);
        let b = Record::new().with("ID", "7").with("HGB", 11);
        assert_ne!(row_signature(&a, &cols), row_signature(&b, &cols));
    }

    #[tokio::test]
    async fn in_memory_save_is_noop() {
        let mut cache = SignatureCache::new();
        cache.insert("7", "abc");
        cache.save().await.unwrap();
        assert_eq!(cache.get("7"), Some("abc"));
        assert!(cache.path().is_none());
    }
}
