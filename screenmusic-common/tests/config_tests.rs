//! Configuration file loading tests
//!
//! Tests that set SCREENMUSIC_CONFIG are marked #[serial] so they do not race
//! on the process environment.

use screenmusic_common::config::{ServiceConfig, TomlConfig, CONFIG_ENV_VAR};
use screenmusic_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Should create temp file");
    file.write_all(content.as_bytes()).expect("Should write config");
    file
}

#[test]
fn test_from_file_reads_all_keys() {
    let file = write_config(
        r#"
bind_address = "0.0.0.0"
port = 8080
database_path = "/srv/screenmusic/catalog.db"
log_filter = "screenmusic_api=info"
"#,
    );

    let config = TomlConfig::from_file(file.path()).unwrap();

    assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.port, Some(8080));
    assert_eq!(
        config.database_path,
        Some(PathBuf::from("/srv/screenmusic/catalog.db"))
    );
    assert_eq!(config.log_filter.as_deref(), Some("screenmusic_api=info"));
}

#[test]
fn test_from_file_partial_keys() {
    let file = write_config("port = 6000\n");

    let config = TomlConfig::from_file(file.path()).unwrap();

    assert_eq!(config.port, Some(6000));
    assert!(config.bind_address.is_none());
    assert!(config.database_path.is_none());
}

#[test]
fn test_from_file_rejects_invalid_toml() {
    let file = write_config("port = \"not a number\"\n");

    let result = TomlConfig::from_file(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_load_uses_env_config_file() {
    let file = write_config("port = 7100\nbind_address = \"0.0.0.0\"\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let toml = TomlConfig::load().unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    let config = ServiceConfig::resolve(None, None, None, toml);
    assert_eq!(config.listen_address(), "0.0.0.0:7100");
}

#[test]
#[serial]
fn test_load_missing_env_config_file_is_error() {
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/screenmusic/config.toml");

    let result = TomlConfig::load();
    env::remove_var(CONFIG_ENV_VAR);

    assert!(matches!(result, Err(Error::Config(_))));
}
