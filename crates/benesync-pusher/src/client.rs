//! Diff and push

use crate::cache::{row_signature, SignatureCache};
use crate::error::PushError;
use crate::DEFAULT_SYNC_COLUMNS;
use benesync_ingest::{IngestResponse, ResponseStatus};
use benesync_store::Record;
use std::time::Duration;

/// Request timeout for one push
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(120);

/// Records that need pushing, plus the cache as it will be after success
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncDiff {
    /// Changed records, in input order
    pub records: Vec<Record>,
    /// Cache to commit once the push succeeds
    pub candidate: SignatureCache,
}

impl SyncDiff {
    /// True when nothing changed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Compare `records` against `cache`
///
/// Records with an empty ID, or the literal `nan`, are skipped. A record is
/// changed when its ID is unknown or its signature differs. Signatures cover
/// the entries of `columns` that appear anywhere in `records`. Changed
/// records come back with every column of the batch, absent fields empty.
#[must_use]
pub fn diff(cache: &SignatureCache, records: &[Record], columns: &[String]) -> SyncDiff {
    let batch = batch_columns(records);
    let signed: Vec<String> = columns
        .iter()
        .filter(|c| batch.iter().any(|b| b == c.trim()))
        .cloned()
        .collect();

    let mut candidate = cache.clone();
    let mut changed = Vec::new();

    for record in records {
        let Some(id) = record.id() else { continue };
        if id.eq_ignore_ascii_case("nan") {
            continue;
        }

        let signature = row_signature(record, &signed);
        if cache.get(&id) != Some(signature.as_str()) {
            changed.push(widen(record, &batch));
            candidate.insert(id, signature);
        }
    }

    SyncDiff {
        records: changed,
        candidate,
    }
}

/// Every column any record carries, in first-seen order
fn batch_columns(records: &[Record]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for key in records.iter().flat_map(Record::keys) {
        if !names.iter().any(|n| n == key) {
            names.push(key.to_string());
        }
    }
    names
}

fn widen(record: &Record, columns: &[String]) -> Record {
    let mut out = Record::new();
    for c in columns {
        out.insert(c, record.get_or_empty(c).clone());
    }
    out
}

/// What a push did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// No changed records; nothing was sent
    UpToDate,
    /// Batch accepted and cache committed
    Pushed {
        /// Records sent
        count: usize,
        /// Endpoint's message
        message: String,
    },
}

/// Pushes changed records to the ingestion endpoint
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: reqwest::Client,
    url: String,
    columns: Vec<String>,
    timeout: Duration,
}

impl SyncClient {
    /// Client for `url` with the default column list
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            columns: DEFAULT_SYNC_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            timeout: PUSH_TIMEOUT,
        }
    }

    /// Replace the synced column list
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Synced columns
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Push whatever changed since the last successful push
    ///
    /// The cache is replaced and saved only when the endpoint answers HTTP
    /// 200 with `status: "success"`; on any failure it is left untouched so
    /// the same records are sent again next time.
    ///
    /// # Errors
    /// - `PushError::Http` / `PushError::Status` / `PushError::Refused` for
    ///   transport or endpoint failures
    /// - `PushError::Io` if the committed cache cannot be saved
    pub async fn push(
        &self,
        cache: &mut SignatureCache,
        records: &[Record],
    ) -> Result<PushOutcome, PushError> {
        let diff = diff(cache, records, &self.columns);
        if diff.is_empty() {
            tracing::debug!("no changed records, skipping push");
            return Ok(PushOutcome::UpToDate);
        }

        let count = diff.records.len();
        tracing::info!(records = count, url = %self.url, "pushing changed records");

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&diff.records)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            let body: String = body.chars().take(200).collect();
            tracing::warn!(status = status.as_u16(), body = %body, "push failed");
            return Err(PushError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: IngestResponse = serde_json::from_str(&body)?;
        if reply.status != ResponseStatus::Success {
            tracing::warn!(message = %reply.message, "push refused");
            return Err(PushError::Refused(reply.message));
        }

        // the candidate was cloned from `cache`, so it keeps the same file
        *cache = diff.candidate;
        cache.save().await?;

        tracing::info!(records = count, message = %reply.message, "push accepted");
        Ok(PushOutcome::Pushed {
            count,
            message: reply.message,
        })
    }
}
