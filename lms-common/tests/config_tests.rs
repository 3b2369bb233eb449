//! Unit tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - CLI > env > platform file > defaults priority
//! - Missing explicit config files are errors, missing implicit ones are not
//! - `LMS_API_BASE` override
//! - Auth token resolution (explicit > env > token file)
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate LMS_* variables are marked with #[serial].

use lms_common::config::{
    ApiConfig, ConfigResolver, TomlConfig, API_BASE_ENV_VAR, API_TOKEN_ENV_VAR, CONFIG_ENV_VAR,
};
use lms_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(API_BASE_ENV_VAR);
    env::remove_var(API_TOKEN_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_path_takes_priority_over_env() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "cli.toml", "[server]\nport = 6001\n");
    let from_env = write_config(&dir, "env.toml", "[server]\nport = 6002\n");
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let config = ConfigResolver::new(Some(cli)).load().unwrap();
    assert_eq!(config.server.port, 6001);

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let from_env = write_config(
        &dir,
        "env.toml",
        "[api]\ncourse_types = [\"live\"]\n[cache]\nttl_secs = 10\n",
    );
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let config = ConfigResolver::new(None).load().unwrap();
    assert_eq!(config.api.course_types, vec!["live"]);
    assert_eq!(config.cache.ttl_secs, 10);

    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_config_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = ConfigResolver::new(Some(missing)).load();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_malformed_config_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let bad = write_config(&dir, "bad.toml", "[server\nport = ");

    let result = ConfigResolver::new(Some(bad)).load();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_api_base_env_override() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "c.toml", "[api]\nbase_url = \"http://from-file/api\"\n");
    env::set_var(API_BASE_ENV_VAR, "http://from-env/api");

    let config = ConfigResolver::new(Some(path)).load().unwrap();
    assert_eq!(config.api.base_url, "http://from-env/api");

    clear_env();
}

#[test]
#[serial]
fn test_token_from_env_when_not_configured() {
    clear_env();
    env::set_var(API_TOKEN_ENV_VAR, "env-token");

    let api = ApiConfig::default();
    assert_eq!(api.resolve_token().as_deref(), Some("env-token"));

    clear_env();
}

#[test]
#[serial]
fn test_token_from_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let token_path = write_config(&dir, "token", "file-token\n");

    let api = ApiConfig {
        token_file: Some(token_path),
        ..ApiConfig::default()
    };
    assert_eq!(api.resolve_token().as_deref(), Some("file-token"));
}

#[test]
#[serial]
fn test_blank_token_file_yields_none() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let token_path = write_config(&dir, "token", "   \n");

    let api = ApiConfig {
        token_file: Some(token_path),
        ..ApiConfig::default()
    };
    assert_eq!(api.resolve_token(), None);
}

#[test]
fn test_full_config_parses() {
    let config: TomlConfig = toml::from_str(
        r#"
        [server]
        port = 7000

        [api]
        base_url = "https://lms.example.com/api"
        token = "t"
        request_timeout_secs = 5
        course_types = ["blended", "free"]

        [cache]
        ttl_secs = 60
        max_entries = 10

        [samples]
        fallback_to_sample = false
        demo_templates = false

        [media]
        fallback_videos = ["https://videos.example.com/a.mp4"]

        [media.overrides]
        "lesson-1" = "https://videos.example.com/pinned.mp4"

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.api.course_types, vec!["blended", "free"]);
    assert!(!config.samples.fallback_to_sample);
    assert!(!config.samples.demo_templates);
    assert_eq!(config.media.fallback_videos.len(), 1);
    assert_eq!(
        config.media.overrides.get("lesson-1").map(String::as_str),
        Some("https://videos.example.com/pinned.mp4")
    );
    assert_eq!(config.logging.level, "debug");
}
