//! Named locks
//!
//! Every [`NamedLock`] with the same name shares one mutex from a global
//! registry, so independently constructed workflows (a scheduled run and a
//! manual trigger, say) still exclude each other. With
//! [`NamedLock::with_file`] the lock also takes an OS lock on that file, which
//! extends the exclusion to other processes (a `deliver` command next to a
//! running server). The lock is held by a [`LockGuard`]; dropping the guard
//! releases it on every exit path.

use crate::error::LockError;
use dashmap::DashMap;
use fs2::FileExt;
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

static REGISTRY: Lazy<DashMap<String, Arc<Mutex<()>>>> = Lazy::new(DashMap::new);

/// Pause between attempts on a contended lock file
const FILE_RETRY: Duration = Duration::from_millis(25);

/// Handle to a named mutual-exclusion lock
#[derive(Debug, Clone)]
pub struct NamedLock {
    name: String,
    inner: Arc<Mutex<()>>,
    file: Option<PathBuf>,
}

impl NamedLock {
    /// Look up (or create) the lock called `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let inner = REGISTRY
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        Self {
            name,
            inner,
            file: None,
        }
    }

    /// Also hold an OS lock on `path` (created if missing) while acquired
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Lock name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cross-process lock file, if any
    #[inline]
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Wait up to `timeout` for the lock
    ///
    /// The bound covers both the in-process mutex and the lock file.
    ///
    /// # Errors
    /// - `LockError::Timeout` if another holder keeps it past the bound
    /// - `LockError::Io` if the lock file cannot be opened
    pub async fn acquire(&self, timeout: Duration) -> Result<LockGuard, LockError> {
        let started = Instant::now();
        let deadline = started + timeout;

        let guard = tokio::time::timeout(timeout, self.inner.clone().lock_owned())
            .await
            .map_err(|_| self.timed_out(timeout))?;

        let file = match &self.file {
            Some(path) => Some(self.lock_file(path, deadline, timeout).await?),
            None => None,
        };

        tracing::debug!(
            lock = %self.name,
            waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "lock acquired"
        );
        Ok(LockGuard {
            name: self.name.clone(),
            _file: file,
            _guard: guard,
        })
    }

    /// Take the lock only if it is free right now
    #[must_use]
    pub fn try_acquire(&self) -> Option<LockGuard> {
        let guard = self.inner.clone().try_lock_owned().ok()?;
        let file = match &self.file {
            Some(path) => {
                let file = open_lock_file(path).ok()?;
                FileExt::try_lock_exclusive(&file).ok()?;
                Some(FileLock(file))
            }
            None => None,
        };
        Some(LockGuard {
            name: self.name.clone(),
            _file: file,
            _guard: guard,
        })
    }

    /// Check if some holder in this process currently owns the lock
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    async fn lock_file(
        &self,
        path: &Path,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<FileLock, LockError> {
        let file = open_lock_file(path).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(FileLock(file)),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(self.timed_out(timeout));
                    }
                    tokio::time::sleep(FILE_RETRY).await;
                }
                Err(source) => {
                    return Err(LockError::Io {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
        }
    }

    fn timed_out(&self, waited: Duration) -> LockError {
        LockError::Timeout {
            name: self.name.clone(),
            waited,
        }
    }
}

fn open_lock_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
}

#[derive(Debug)]
struct FileLock(File);

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

/// Proof of lock ownership; dropping it releases the lock
#[derive(Debug)]
pub struct LockGuard {
    name: String,
    // dropped before the mutex guard: the file is released first
    _file: Option<FileLock>,
    _guard: OwnedMutexGuard<()>,
}

impl LockGuard {
    /// Name of the held lock
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        tracing::debug!(lock = %self.name, "lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_name_shares_one_lock() {
        let a = NamedLock::new("lock-test-shared");
        let b = NamedLock::new("lock-test-shared");

        let guard = a.acquire(Duration::from_millis(10)).await.unwrap();
        assert!(b.is_held());
        assert!(b.try_acquire().is_none());

        drop(guard);
        assert!(!b.is_held());
        assert!(b.try_acquire().is_some());
    }

    #[tokio::test]
    async fn acquire_times_out_while_held() {
        let lock = NamedLock::new("lock-test-timeout");
        let _held = lock.acquire(Duration::ZERO).await.unwrap();

        let err = lock.acquire(Duration::from_millis(20)).await.unwrap_err();
        match err {
            LockError::Timeout { name, waited } => {
                assert_eq!(name, "lock-test-timeout");
                assert_eq!(waited, Duration::from_millis(20));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn different_names_are_independent() {
        let _a = NamedLock::new("lock-test-a").acquire(Duration::ZERO).await.unwrap();
        assert!(NamedLock::new("lock-test-b").try_acquire().is_some());
    }

    #[tokio::test]
    async fn waiter_gets_lock_after_release() {
        let lock = NamedLock::new("lock-test-handoff");
        let guard = lock.acquire(Duration::ZERO).await.unwrap();

        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move { lock.acquire(Duration::from_secs(5)).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        assert!(waiter.await.unwrap().is_ok());
    }

    // Distinct names keep the in-process mutexes apart, so only the file
    // lock stands between the two holders, as between two processes.
    #[tokio::test]
    async fn shared_lock_file_excludes_other_holders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.lock");
        let a = NamedLock::new("lock-test-file-a").with_file(&path);
        let b = NamedLock::new("lock-test-file-b").with_file(&path);

        let guard = a.acquire(Duration::ZERO).await.unwrap();
        let err = b.acquire(Duration::from_millis(60)).await.unwrap_err();
        assert!(matches!(err, LockError::Timeout { .. }));
        assert!(b.try_acquire().is_none());

        drop(guard);
        assert!(b.acquire(Duration::from_millis(60)).await.is_ok());
    }

    #[tokio::test]
    async fn file_waiter_gets_lock_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locks").join("delivery.lock");
        let a = NamedLock::new("lock-test-file-handoff-a").with_file(&path);
        let b = NamedLock::new("lock-test-file-handoff-b").with_file(&path);

        let guard = a.acquire(Duration::ZERO).await.unwrap();
        let waiter = tokio::spawn(async move { b.acquire(Duration::from_secs(5)).await.map(|_| ()) });
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(guard);

        assert!(waiter.await.unwrap().is_ok());
        assert!(path.exists());
    }
}
