use backpack_ui::settings::{Settings, DEVICE_URL_ENV};
use serial_test::serial;
use std::time::Duration;
use tempfile::tempdir;

#[test]
#[serial]
fn missing_file_gives_defaults() {
    std::env::remove_var(DEVICE_URL_ENV);
    let dir = tempdir().unwrap();
    let settings = Settings::load(dir.path().join("settings.json")).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.device_url, "http://10.0.0.1");
    assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    assert_eq!(settings.mavlink_poll_interval(), Duration::from_secs(1));
    assert_eq!(settings.scan_delay(), Duration::from_secs(2));
    assert!(settings.enable_toasts);
}

#[test]
#[serial]
fn env_sets_default_device_url() {
    std::env::set_var(DEVICE_URL_ENV, "http://192.168.4.1");
    let settings = Settings::default();
    std::env::remove_var(DEVICE_URL_ENV);
    assert_eq!(settings.device_url, "http://192.168.4.1");
}

#[test]
#[serial]
fn partial_file_keeps_other_defaults() {
    std::env::remove_var(DEVICE_URL_ENV);
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"device_url": "http://backpack.local", "log_line_limit": 50}"#).unwrap();
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.device_url, "http://backpack.local");
    assert_eq!(settings.log_line_limit, 50);
    assert_eq!(settings.request_timeout_secs, 10);
}

#[test]
fn save_creates_parent_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    let settings = Settings {
        debug_logging: true,
        mavlink_poll_ms: 250,
        ..Settings::default()
    };
    settings.save(&path).unwrap();
    assert_eq!(Settings::load(&path).unwrap(), settings);
}

#[test]
fn intervals_have_floors() {
    let settings = Settings {
        request_timeout_secs: 0,
        mavlink_poll_ms: 1,
        ..Settings::default()
    };
    assert_eq!(settings.request_timeout(), Duration::from_secs(1));
    assert_eq!(settings.mavlink_poll_interval(), Duration::from_millis(100));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(Settings::load(&path).is_err());
}
