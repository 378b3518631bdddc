// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use qrscan::backends::camera::CameraBackendType;
use qrscan::errors::ConfigError;
use qrscan::{Config, TokenSource};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("qrscan-config-{}-{}", name, std::process::id()))
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(config.endpoint.starts_with("https://"));
    assert_eq!(config.token, TokenSource::Env("QRSCAN_TOKEN".to_string()));
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.backend, CameraBackendType::V4l2);
    assert_eq!(config.max_dimension, 640);
    assert_eq!(config.preferred_device, None);
    assert_eq!(config.scan_timeout_secs, None);
}

#[test]
fn test_partial_json_fills_defaults() {
    let config = Config::from_json(
        r#"{"endpoint": "http://localhost:8080/decode", "token": {"value": "abc"}, "backend": "ImageFiles"}"#,
    )
    .unwrap();

    assert_eq!(config.endpoint, "http://localhost:8080/decode");
    assert_eq!(config.token.resolve().unwrap(), "abc");
    assert_eq!(config.backend, CameraBackendType::ImageFiles);
    assert_eq!(config.request_timeout_secs, 30);
}

#[test]
fn test_missing_file_yields_defaults() {
    let config = Config::load_from(&temp_path("missing")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_malformed_file_is_parse_error() {
    let path = temp_path("malformed");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_from(&path);
    assert!(matches!(result, Err(ConfigError::Parse(_))));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_token_from_file() {
    let path = temp_path("token");
    std::fs::write(&path, "file-secret\n").unwrap();

    let source = TokenSource::File(path.clone());
    assert_eq!(source.resolve().unwrap(), "file-secret");

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(source.resolve(), Err(ConfigError::MissingToken(_))));
}

#[test]
fn test_config_roundtrips_through_file() {
    let path = temp_path("roundtrip");
    let mut config = Config::default();
    config.preferred_device = Some("BRIO".to_string());
    config.scan_timeout_secs = Some(15);
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);

    std::fs::remove_file(&path).unwrap();
}
