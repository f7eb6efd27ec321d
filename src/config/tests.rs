use std::env;
use std::fs;

use serial_test::serial;
use tempfile::TempDir;

use super::load_config;
use super::settings::{LogFormat, Settings, StoreBackend};

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.gateway.listen_host, "0.0.0.0");
    assert_eq!(settings.gateway.listen_port, 1885);
    assert_eq!(settings.broker.keepalive_secs, 30);
    assert_eq!(settings.broker.name.len(), 8);
    assert_eq!(settings.store.backend, StoreBackend::Redis);
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.logging.format, LogFormat::Full);
}

#[test]
fn test_default_broker_names_differ() {
    assert_ne!(Settings::default().broker.name, Settings::default().broker.name);
}

#[test]
#[serial]
fn load_config_from_explicit_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("gateway.toml");
    fs::write(
        &path,
        r#"
            [gateway]
            listen_port = 20000

            [broker]
            name = "edge-a"
            keepalive_secs = 5

            [store]
            backend = "memory"

            [logging]
            format = "json"
        "#,
    )
    .expect("write config file");

    let cfg = load_config(Some(&path)).expect("load_config failed");
    assert_eq!(cfg.gateway.listen_port, 20000);
    assert_eq!(cfg.gateway.listen_host, "0.0.0.0");
    assert_eq!(cfg.broker.name, "edge-a");
    assert_eq!(cfg.broker.keepalive_secs, 5);
    assert_eq!(cfg.broker.drain_interval_ms, 10);
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    assert_eq!(cfg.logging.format, LogFormat::Json);
}

#[test]
#[serial]
fn load_config_missing_explicit_file_fails() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("absent.toml");
    assert!(load_config(Some(&path)).is_err());
}

#[test]
#[serial]
fn load_config_reads_default_file_from_working_dir() {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    fs::write(
        "config/default.toml",
        r#"
            [store]
            backend = "sled"
            path = "/var/lib/snbroker"
        "#,
    )
    .expect("write config file");

    let cfg = load_config(None);

    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.store.backend, StoreBackend::Sled);
    assert_eq!(cfg.store.path, "/var/lib/snbroker");
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("gateway.toml");
    fs::write(&path, "[broker]\nkeepalive_secs = 5\n").expect("write config file");

    temp_env::with_vars(
        [
            ("SNBROKER_BROKER__KEEPALIVE_SECS", Some("90")),
            ("SNBROKER_GATEWAY__LISTEN_HOST", Some("127.0.0.1")),
        ],
        || {
            let cfg = load_config(Some(&path)).expect("load_config failed");
            assert_eq!(cfg.broker.keepalive_secs, 90);
            assert_eq!(cfg.gateway.listen_host, "127.0.0.1");
        },
    );
}

#[test]
#[serial]
fn zero_keepalive_is_rejected() {
    temp_env::with_var("SNBROKER_BROKER__KEEPALIVE_SECS", Some("0"), || {
        let err = load_config(None).expect_err("zero keepalive must not load");
        assert!(err.to_string().contains("keepalive_secs"), "{err}");
    });
}

#[test]
#[serial]
fn zero_keepalive_in_file_is_rejected() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("gateway.toml");
    fs::write(&path, "[broker]\nkeepalive_secs = 0\n").expect("write config file");
    assert!(load_config(Some(&path)).is_err());
}
