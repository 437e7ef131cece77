//! Round-trip tests for configuration files

use std::time::Duration;
use tempfile::TempDir;
use tramway_settings::{Config, ConfigError, SettingsError};

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tramway.toml");

    let mut config = Config::new();
    config.cable.length = 3_200.0;
    config.platform.unload_window_ms = 2_500;
    config.station.in_queue_enabled = false;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.platform_timing().unload_window,
        Duration::from_millis(2_500)
    );
    assert_eq!(loaded.station_config().incoming_capacity, None);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tramway.json");

    let mut config = Config::new();
    config.hub.enable_history = true;
    config.cabin.capacity = 12;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert!(loaded.hub_config().enable_history);
    assert_eq!(loaded.cabin_config().capacity, 12);
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[supervisor]\ntick_ms = 0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Invalid(ConfigError::OutOfRange {
            key: "supervisor.tick_ms",
            ..
        })
    ));
}

#[test]
fn test_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"cable\": ").unwrap();

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::Json(_))
    ));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());

    assert!(matches!(
        Config::load_from_file(&dir.path().join("absent.toml")),
        Err(SettingsError::Read { .. })
    ));
}
