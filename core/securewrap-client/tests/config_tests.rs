use std::collections::HashMap;

use pretty_assertions::assert_eq;
use securewrap_client::{
    ClientConfig, ClientError, DEFAULT_AUTHORITY_URL, DEFAULT_TIMEOUT_SECS, ENV_AUTHORITY_URL,
    ENV_DEPLOYMENT_KEY, ENV_TIMEOUT_SECS,
};
use securewrap_crypto::DeploymentKey;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults() {
    let config = ClientConfig::default();
    assert_eq!(config.authority_url, DEFAULT_AUTHORITY_URL);
    assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert!(config.deployment_key.is_none());
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "authority_url = \"https://auth.example:9000\"\n").unwrap();

    let config = ClientConfig::load_from(&path).unwrap();
    assert_eq!(config.authority_url, "https://auth.example:9000");
    assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
}

#[test]
fn invalid_toml_is_config_error() {
    let err = ClientConfig::from_toml("request_timeout_secs = \"soon\"").unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn environment_overrides_file_values() {
    let mut config = ClientConfig::from_toml(
        "authority_url = \"http://file:1\"\nrequest_timeout_secs = 3\n",
    )
    .unwrap();
    config
        .apply_overrides(env(&[
            (ENV_AUTHORITY_URL, "http://env:2"),
            (ENV_TIMEOUT_SECS, "7"),
        ]))
        .unwrap();
    assert_eq!(config.authority_url, "http://env:2");
    assert_eq!(config.request_timeout_secs, 7);
}

#[test]
fn blank_environment_values_are_ignored() {
    let mut config = ClientConfig::default();
    config
        .apply_overrides(env(&[(ENV_AUTHORITY_URL, "  "), (ENV_DEPLOYMENT_KEY, "")]))
        .unwrap();
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn non_numeric_timeout_override_fails() {
    let mut config = ClientConfig::default();
    let err = config
        .apply_overrides(env(&[(ENV_TIMEOUT_SECS, "ten")]))
        .unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn deployment_key_round_trips_through_config() {
    let key = DeploymentKey::generate();
    let mut config = ClientConfig::default();
    config
        .apply_overrides(env(&[(ENV_DEPLOYMENT_KEY, &key.to_base64())]))
        .unwrap();
    assert_eq!(config.deployment_key().unwrap(), key);
}

#[test]
fn missing_deployment_key_is_config_error() {
    let err = ClientConfig::default().deployment_key().unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn malformed_deployment_key_is_config_error() {
    let config = ClientConfig {
        deployment_key: Some("not base64!".into()),
        ..ClientConfig::default()
    };
    assert!(matches!(config.deployment_key(), Err(ClientError::Config(_))));
}
