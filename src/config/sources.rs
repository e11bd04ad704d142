use super::models::AddonConfig;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "ADDONBOX_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/addonbox.toml";
const ENV_PREFIX: &str = "ADDONBOX";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<AddonConfig, ConfigError> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<AddonConfig, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // ADDONBOX__CACHE__CATALOG__MAX_AGE -> cache.catalog.max_age
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdata::UserDataEncoding;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.meta.base_url, "https://v3-cinemeta.strem.io");
        assert_eq!(config.meta.timeout.as_duration(), Duration::from_secs(2));
        assert_eq!(config.meta.ttl.as_duration(), Duration::from_secs(30 * 86_400));
        assert!(config.cache.catalog.max_age.is_zero());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:7000"
request_timeout = "30s"
redirect_url = "https://example.com/configure"

[cache.catalog]
max_age = "1h"
stale_while_revalidate = "5m"
stale_if_error = "1d"
public = true
etag = true

[cache.stream]
max_age = 60

[user_data]
encoding = "base64"

[meta]
log_media_name = true
ttl = "7d"
cache_path = "data/meta"

[logging]
level = "debug"
log_ips = true
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:7000");
        assert_eq!(config.server.request_timeout.as_duration(), Duration::from_secs(30));
        assert_eq!(
            config.server.redirect_url.as_deref(),
            Some("https://example.com/configure")
        );

        let catalog = config.cache.catalog;
        assert_eq!(catalog.max_age.as_duration(), Duration::from_secs(3600));
        assert_eq!(catalog.stale_while_revalidate.as_duration(), Duration::from_secs(300));
        assert_eq!(catalog.stale_if_error.as_duration(), Duration::from_secs(86_400));
        assert!(catalog.public && catalog.etag);
        assert_eq!(config.cache.stream.max_age.as_duration(), Duration::from_secs(60));

        assert_eq!(config.user_data.encoding, UserDataEncoding::Base64);
        assert!(config.meta.log_media_name);
        assert_eq!(config.meta.ttl.as_duration(), Duration::from_secs(7 * 86_400));
        assert_eq!(config.meta.cache_path, Some(PathBuf::from("data/meta")));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.log_ips);
    }

    // Environment overrides are not exercised here because env::set_var
    // is unsafe in edition 2024 and would race with parallel tests.
}
