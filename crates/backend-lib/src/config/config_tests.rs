use super::*;
use figment::providers::Toml;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_default_settings_are_valid() {
    let settings = Settings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.storage.backend, StorageBackend::FlatFile);
    assert_eq!(settings.matches.capacity_policy, CapacityPolicy::Advisory);
}

#[test]
fn test_settings_validation() {
    let settings = Settings::default();

    let mut invalid = settings.clone();
    invalid.log_level = "loud".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.session_ttl_secs = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.password_requirements.min_length = 4;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.rate_limit.max_requests = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.matches.invite_code_length = 3;
    assert!(invalid.validate().is_err());

    let mut invalid = settings;
    invalid.realtime.channel_capacity = 0;
    assert!(invalid.validate().is_err());
}

#[test]
fn test_toml_layer_overrides_defaults() {
    let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(
        r#"
        bind_addr = "0.0.0.0:8080"
        log_level = "debug"

        [storage]
        backend = "memory"

        [matches]
        capacity_policy = "strict"
        statistics_quorum = 3
        "#,
    ));

    let settings = Settings::from_figment(figment).unwrap();
    assert_eq!(settings.bind_addr.to_string(), "0.0.0.0:8080");
    assert_eq!(settings.log_level, "debug");
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    // untouched nested keys keep their defaults
    assert_eq!(settings.storage.path, PathBuf::from("data"));
    assert_eq!(settings.matches.capacity_policy, CapacityPolicy::Strict);
    assert_eq!(settings.matches.statistics_quorum, 3);
    assert_eq!(settings.matches.invite_code_length, 8);
}

#[test]
fn test_invalid_file_values_are_rejected() {
    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::string("session_ttl_secs = 0"));
    assert!(Settings::from_figment(figment).is_err());
}

#[test]
fn test_load_from_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("matchday.toml");

    std::fs::write(
        &config_path,
        r#"
        bind_addr = "127.0.0.1:4000"
        session_ttl_secs = 3600

        [storage]
        path = "test_data"
        "#,
    )
    .unwrap();

    let settings = Settings::load_from(&config_path).unwrap();
    assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:4000");
    assert_eq!(settings.storage.path, PathBuf::from("test_data"));
    assert_eq!(settings.session_ttl_secs, 3600);
}

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.matches.public_base_url, "http://localhost:3000");
}
