//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument / environment variable (handled by the binary)
//! 2. TOML config file
//! 3. OS-dependent compiled default (fallback)
//!
//! The config file is `$SCREENMUSIC_CONFIG` when set, otherwise the first of
//! `<config_dir>/screenmusic/config.toml` and `/etc/screenmusic/config.toml`
//! (Linux only) that exists.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SCREENMUSIC_CONFIG";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load the config file, or defaults if none exists
    ///
    /// A file that exists but does not parse is an error, not a fallback.
    /// An explicit `$SCREENMUSIC_CONFIG` that does not exist is also an error.
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(explicit);
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(&path);
        }

        match locate_config_file() {
            Some(path) => {
                tracing::info!("Loading config file {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub log_filter: Option<String>,
}

impl ServiceConfig {
    /// Merge overrides (CLI/ENV) over the TOML file over compiled defaults
    pub fn resolve(
        bind_address: Option<String>,
        port: Option<u16>,
        database_path: Option<PathBuf>,
        toml: TomlConfig,
    ) -> Self {
        Self {
            bind_address: bind_address
                .or(toml.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: port.or(toml.port).unwrap_or(DEFAULT_PORT),
            database_path: database_path
                .or(toml.database_path)
                .unwrap_or_else(default_database_path),
            log_filter: toml.log_filter,
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Find the config file for this platform, if any
fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("screenmusic").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/screenmusic/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    let root = if cfg!(target_os = "linux") {
        // ~/.local/share/screenmusic (or /var/lib/screenmusic for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("screenmusic"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/screenmusic"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("screenmusic"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/screenmusic"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("screenmusic"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\screenmusic"))
    } else {
        PathBuf::from("./screenmusic_data")
    };

    root.join("screenmusic.db")
}
