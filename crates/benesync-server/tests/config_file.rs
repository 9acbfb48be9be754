//! Loading service configuration from disk

use benesync_server::{ConfigError, MailSection, ServiceConfig};
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

const FULL: &str = r#"
[server]
bind = "0.0.0.0:8088"

[store]
path = "/var/lib/benesync/sheet.json"
sheet = "Beneficiaries"

[drive]
root = "/var/lib/benesync/drive"
template = "templates/health.txt"
folder = "out"

[mail]
transport = "relay"
url = "http://relay.internal/send"
from = "reports@clinic.example"

[delivery]
lock_name = "nightly"
lock_timeout_secs = 5
schedule_interval_secs = 3600

[ingest]
serialize_with_delivery_lock = true
"#;

#[test]
fn full_document_parses() {
    let config = ServiceConfig::from_toml_str(FULL).unwrap();

    assert_eq!(config.server.bind, SocketAddr::from(([0, 0, 0, 0], 8088)));
    assert_eq!(config.store.sheet, "Beneficiaries");
    assert_eq!(config.drive.template, "templates/health.txt");
    assert_eq!(
        config.mail,
        MailSection::Relay {
            url: "http://relay.internal/send".into(),
            from: "reports@clinic.example".into(),
        }
    );
    assert_eq!(config.delivery.lock_timeout(), Duration::from_secs(5));
    assert_eq!(
        config.delivery.schedule_interval(),
        Some(Duration::from_secs(3600))
    );
    assert!(config.ingest.serialize_with_delivery_lock);
}

#[test]
fn partial_sections_keep_defaults() {
    let config = ServiceConfig::from_toml_str(
        r#"
        [delivery]
        lock_timeout_secs = 10

        [mail]
        transport = "outbox"
        dir = "/tmp/outbox"
        "#,
    )
    .unwrap();

    let defaults = ServiceConfig::default();
    assert_eq!(config.delivery.lock_name, defaults.delivery.lock_name);
    assert_eq!(config.delivery.lock_timeout_secs, 10);
    assert_eq!(config.store, defaults.store);
    assert_eq!(
        config.mail,
        MailSection::Outbox {
            dir: PathBuf::from("/tmp/outbox")
        }
    );
}

#[test]
fn unknown_transport_is_a_parse_error() {
    let err = ServiceConfig::from_toml_str("[mail]\ntransport = \"carrier-pigeon\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[tokio::test]
async fn load_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("benesync.toml");
    tokio::fs::write(&path, "[store]\nsheet = \"Data\"\n").await.unwrap();

    let config = ServiceConfig::load(&path).await.unwrap();

    assert_eq!(config.store.sheet, "Data");
}

#[tokio::test]
async fn load_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = ServiceConfig::load(dir.path().join("absent.toml"))
        .await
        .unwrap_err();
    assert!(err.is_missing_file());
}
