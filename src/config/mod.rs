//! Configuration management for addonbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use addonbox::config::AddonConfig;
//!
//! let config = AddonConfig::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `ADDONBOX__<section>__<key>`
//!
//! Examples:
//! - `ADDONBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `ADDONBOX__CACHE__STREAM__MAX_AGE=1h`
//! - `ADDONBOX__META__PUT_META_IN_CONTEXT=true`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/addonbox.toml`.
//! This can be overridden using the `ADDONBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{
    AddonConfig, CacheConfig, LoggingConfig, MetaConfig, ResourceCacheConfig, ServerConfig,
    UserDataConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl AddonConfig {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`ADDONBOX__*`)
    /// 2. TOML file (default: `config/addonbox.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}
