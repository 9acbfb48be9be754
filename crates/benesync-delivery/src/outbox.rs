//! Outbox directory transport

use crate::error::MailError;
use crate::mail::{MailSender, OutgoingMail};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Orders envelopes written within the same clock tick
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Writes each message as a JSON envelope into a directory
///
/// File names are `<UTC timestamp>-<sequence>-<uuid>.json`, so a directory listing
/// sorted by name is in send order. A separate relay process is expected to
/// pick the envelopes up.
#[derive(Debug, Clone)]
pub struct OutboxMailSender {
    dir: PathBuf,
}

impl OutboxMailSender {
    /// Create sender writing into `dir` (created on first send)
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Outbox directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read back every envelope in the outbox, oldest first
    ///
    /// # Errors
    /// - `MailError::Io` if the directory or a file cannot be read
    /// - `MailError::Codec` if a file is not an envelope
    pub async fn messages(&self) -> Result<Vec<OutgoingMail>, MailError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MailError::io_error(&self.dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MailError::io_error(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut messages = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| MailError::io_error(&path, e))?;
            messages.push(serde_json::from_slice(&bytes)?);
        }
        Ok(messages)
    }

    fn envelope_name() -> String {
        format!(
            "{}-{:06}-{}.json",
            Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
            SEQUENCE.fetch_add(1, Ordering::Relaxed) % 1_000_000,
            Uuid::new_v4()
        )
    }
}

#[async_trait::async_trait]
impl MailSender for OutboxMailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        mail.validate()?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MailError::io_error(&self.dir, e))?;

        let path = self.dir.join(Self::envelope_name());
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(mail)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| MailError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| MailError::io_error(&path, e))?;

        tracing::info!(to = %mail.to, envelope = %path.display(), "mail queued in outbox");
        Ok(())
    }
}
