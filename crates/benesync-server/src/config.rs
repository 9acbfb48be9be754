//! Service configuration
//!
//! Loaded from a TOML file; every section and every field is optional and
//! falls back to [`Default`]. `BENESYNC_BIND` and `BENESYNC_STORE` override
//! the bind address and store path after the file is read.

use benesync_delivery::{DEFAULT_LOCK_NAME, DEFAULT_LOCK_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides `server.bind`
pub const BIND_ENV: &str = "BENESYNC_BIND";
/// Overrides `store.path`
pub const STORE_ENV: &str = "BENESYNC_STORE";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An override could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Rejected value
        value: String,
    },
}

impl ConfigError {
    /// Check if the config file was simply absent
    #[must_use]
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Whole-service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener
    pub server: ServerSection,
    /// Sheet backing file
    pub store: StoreSection,
    /// Template and report folder
    pub drive: DriveSection,
    /// Mail transport
    pub mail: MailSection,
    /// Delivery lock and schedule
    pub delivery: DeliverySection,
    /// Ingestion options
    pub ingest: IngestSection,
}

impl ServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or unknown mail transport
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse the file at `path`, then apply environment overrides
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` / `ConfigError::InvalidValue` as for
    ///   [`Self::from_toml_str`] and [`Self::apply_overrides`]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        config.apply_env()
    }

    /// Apply `BENESYNC_*` variables from the process environment
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` if `BENESYNC_BIND` is not a socket address
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in
    /// production); empty values are ignored
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` if the bind override is not a socket address
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = get(BIND_ENV) {
            self.server.bind = bind
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: BIND_ENV.to_string(),
                    value: bind.clone(),
                })?;
        }
        if let Some(path) = get(STORE_ENV) {
            self.store.path = PathBuf::from(path);
        }
        Ok(self)
    }

    /// With bind address
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.server.bind = bind;
        self
    }

    /// With store file
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }

    /// With drive root
    #[must_use]
    pub fn with_drive_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.drive.root = root.into();
        self
    }

    /// With mail transport
    #[must_use]
    pub fn with_mail(mut self, mail: MailSection) -> Self {
        self.mail = mail;
        self
    }

    /// With delivery lock name
    #[must_use]
    pub fn with_lock_name(mut self, name: impl Into<String>) -> Self {
        self.delivery.lock_name = name.into();
        self
    }

    /// With delivery lock timeout
    #[must_use]
    pub fn with_lock_timeout_secs(mut self, secs: u64) -> Self {
        self.delivery.lock_timeout_secs = secs;
        self
    }

    /// With scheduled delivery
    #[must_use]
    pub fn with_schedule_interval_secs(mut self, secs: u64) -> Self {
        self.delivery.schedule_interval_secs = Some(secs);
        self
    }

    /// With an explicit delivery lock file
    #[must_use]
    pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.delivery.lock_file = Some(path.into());
        self
    }

    /// Lock file used by delivery: the configured one, else one beside the
    /// store file
    #[must_use]
    pub fn delivery_lock_file(&self) -> PathBuf {
        self.delivery.lock_file.clone().unwrap_or_else(|| {
            let mut path = self.store.path.clone().into_os_string();
            path.push(".delivery.lock");
            PathBuf::from(path)
        })
    }

    /// Serialize ingestion with delivery
    #[must_use]
    pub fn with_ingest_lock(mut self, enabled: bool) -> Self {
        self.ingest.serialize_with_delivery_lock = enabled;
        self
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Listen address
    pub bind: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// `[store]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// JSON sheet document
    pub path: PathBuf,
    /// Sheet name used in logs and errors
    pub sheet: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/sheet.json"),
            sheet: "Sheet1".to_string(),
        }
    }
}

/// `[drive]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSection {
    /// Directory all drive paths resolve against
    pub root: PathBuf,
    /// Template document, relative to `root`
    pub template: String,
    /// Folder receiving generated reports, relative to `root`
    pub folder: String,
}

impl Default for DriveSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/drive"),
            template: "templates/report_template.txt".to_string(),
            folder: "reports".to_string(),
        }
    }
}

/// `[mail]`: where report mails go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum MailSection {
    /// JSON envelopes in a directory
    Outbox {
        /// Directory receiving one file per message
        dir: PathBuf,
    },
    /// HTTP relay
    Relay {
        /// Relay endpoint
        url: String,
        /// Sender address
        from: String,
    },
}

impl Default for MailSection {
    fn default() -> Self {
        Self::Outbox {
            dir: PathBuf::from("data/outbox"),
        }
    }
}

/// `[delivery]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySection {
    /// Name of the run lock
    pub lock_name: String,
    /// How long a run waits for the lock
    pub lock_timeout_secs: u64,
    /// Run delivery on this interval while serving; unset or zero disables
    pub schedule_interval_secs: Option<u64>,
    /// File locked for the whole run so separate processes exclude each
    /// other; defaults to `<store.path>.delivery.lock`
    pub lock_file: Option<PathBuf>,
}

impl DeliverySection {
    /// Lock wait as a duration
    #[inline]
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    /// Scheduler period, if enabled
    #[must_use]
    pub fn schedule_interval(&self) -> Option<Duration> {
        self.schedule_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for DeliverySection {
    fn default() -> Self {
        Self {
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            lock_timeout_secs: DEFAULT_LOCK_TIMEOUT.as_secs(),
            schedule_interval_secs: None,
            lock_file: None,
        }
    }
}

/// `[ingest]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Take the delivery lock around each batch
    pub serialize_with_delivery_lock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ServiceConfig::from_toml_str("").unwrap(), ServiceConfig::default());
    }

    #[test]
    fn zero_interval_disables_schedule() {
        let config = ServiceConfig::new().with_schedule_interval_secs(0);
        assert!(config.delivery.schedule_interval().is_none());

        let config = ServiceConfig::new().with_schedule_interval_secs(60);
        assert_eq!(
            config.delivery.schedule_interval(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn delivery_lock_file_defaults_beside_store() {
        let config = ServiceConfig::new().with_store_path("/srv/sheet.json");
        assert_eq!(
            config.delivery_lock_file(),
            PathBuf::from("/srv/sheet.json.delivery.lock")
        );

        let config = config.with_lock_file("/run/benesync.lock");
        assert_eq!(config.delivery_lock_file(), PathBuf::from("/run/benesync.lock"));
    }

    #[test]
    fn overrides_replace_bind_and_store() {
        let config = ServiceConfig::new()
            .apply_overrides(|key| match key {
                BIND_ENV => Some("0.0.0.0:9000".to_string()),
                STORE_ENV => Some("/srv/sheet.json".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server.bind, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.store.path, PathBuf::from("/srv/sheet.json"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = ServiceConfig::new()
            .apply_overrides(|_| Some("  ".to_string()))
            .unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn bad_bind_override_is_rejected() {
        let err = ServiceConfig::new()
            .apply_overrides(|key| (key == BIND_ENV).then(|| "not-an-addr".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
