#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use super::*;

fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(
        |key| map.get(key).cloned(),
        || Ok(PathBuf::from("/tmp/pftui-default")),
    )
}

#[test]
fn test_defaults() {
    let config = config_from(&[]).unwrap();
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.data_dir, PathBuf::from("/tmp/pftui-default"));
    assert_eq!(config.log_filter, "info");
    assert_eq!(config.log_format, LogFormat::Text);
}

#[test]
fn test_overrides() {
    let config = config_from(&[
        ("PFT_API_URL", "https://finance.example.com/api"),
        ("PFT_REQUEST_TIMEOUT_SECS", "5"),
        ("PFT_DATA_DIR", "/var/lib/pftui"),
        ("PFT_LOG", "pftui=debug"),
        ("PFT_LOG_FORMAT", "JSON"),
    ])
    .unwrap();
    assert_eq!(config.api_url, "https://finance.example.com/api");
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.session_path(), PathBuf::from("/var/lib/pftui/session.json"));
    assert_eq!(config.log_path(), PathBuf::from("/var/lib/pftui/pftui.log"));
    assert_eq!(config.log_filter, "pftui=debug");
    assert_eq!(config.log_format, LogFormat::Json);
}

#[test]
fn test_rejects_bad_url() {
    assert!(config_from(&[("PFT_API_URL", "localhost:8080")]).is_err());
}

#[test]
fn test_rejects_bad_timeout() {
    assert!(config_from(&[("PFT_REQUEST_TIMEOUT_SECS", "soon")]).is_err());
    assert!(config_from(&[("PFT_REQUEST_TIMEOUT_SECS", "0")]).is_err());
}

#[test]
fn test_blank_api_url_falls_back() {
    let config = config_from(&[("PFT_API_URL", "  ")]).unwrap();
    assert_eq!(config.api_url, DEFAULT_API_URL);
}
