//! Configuration module for bracket-server.
//!
//! Handles loading configuration from the TOML file and CLI overrides and
//! turning it into the runtime types used by the engine.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{EngineConfig, NotifierConfig, PersistenceConfig, ServerConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub notifier: NotifierConfig,
    pub persistence: PersistenceConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides and validate.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.engine.lock_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "engine.lock_timeout_ms must be positive".to_string(),
        ));
    }
    if config.engine.max_participants_limit < 2 {
        return Err(ConfigError::ValidationError(
            "engine.max_participants_limit must be at least 2".to_string(),
        ));
    }
    if config.persistence.snapshot_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "persistence.snapshot_interval_secs must be positive".to_string(),
        ));
    }
    if !config.notifier.webhook_urls.is_empty() && config.notifier.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "notifier.secret is required when webhook_urls are set".to_string(),
        ));
    }
    for url in &config.notifier.webhook_urls {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "webhook url {url} must use http or https"
            )));
        }
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        engine: EngineConfig {
            lock_timeout: Duration::from_millis(file_config.engine.lock_timeout_ms),
            max_participants_limit: file_config.engine.max_participants_limit,
            ..EngineConfig::default()
        },
        notifier: NotifierConfig::new(
            file_config.notifier.webhook_urls,
            file_config.notifier.secret.into_bytes().into_boxed_slice(),
        ),
        persistence: PersistenceConfig {
            snapshot_path: file_config.persistence.snapshot_path,
            snapshot_interval: Duration::from_secs(file_config.persistence.snapshot_interval_secs),
        },
    }
}
