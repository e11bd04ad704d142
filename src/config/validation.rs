use super::models::AddonConfig;
use crate::handlers::ResourceKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cache.{kind}.{option} requires cache.{kind}.max_age to be set")]
    CacheOptionWithoutMaxAge {
        kind: ResourceKind,
        option: &'static str,
    },

    #[error("logging.{option} has no effect while request logging is disabled")]
    RequestLoggingDisabled { option: &'static str },

    #[error("{field} must be positive")]
    ZeroDuration { field: &'static str },

    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Validate the entire configuration
pub fn validate(config: &AddonConfig) -> Result<(), ValidationError> {
    validate_cache(config)?;
    validate_logging(config)?;
    validate_server(config)?;
    validate_meta(config)?;
    Ok(())
}

/// Every caching option only makes sense together with a max age
fn validate_cache(config: &AddonConfig) -> Result<(), ValidationError> {
    for kind in ResourceKind::ALL {
        let cache = config.cache.for_kind(kind);
        if !cache.max_age.is_zero() {
            continue;
        }

        let option = if cache.public {
            Some("public")
        } else if cache.etag {
            Some("etag")
        } else if !cache.stale_while_revalidate.is_zero() {
            Some("stale_while_revalidate")
        } else if !cache.stale_if_error.is_zero() {
            Some("stale_if_error")
        } else {
            None
        };

        if let Some(option) = option {
            return Err(ValidationError::CacheOptionWithoutMaxAge { kind, option });
        }
    }

    Ok(())
}

fn validate_logging(config: &AddonConfig) -> Result<(), ValidationError> {
    if !config.logging.disable_request_logging {
        return Ok(());
    }

    if config.logging.log_ips {
        return Err(ValidationError::RequestLoggingDisabled { option: "log_ips" });
    }
    if config.logging.log_user_agent {
        return Err(ValidationError::RequestLoggingDisabled {
            option: "log_user_agent",
        });
    }
    if config.meta.log_media_name {
        return Err(ValidationError::RequestLoggingDisabled {
            option: "log_media_name",
        });
    }

    Ok(())
}

fn validate_server(config: &AddonConfig) -> Result<(), ValidationError> {
    if config.server.request_timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "server.request_timeout",
        });
    }

    if let Some(url) = &config.server.redirect_url {
        validate_url("server.redirect_url", url)?;
    }

    Ok(())
}

fn validate_meta(config: &AddonConfig) -> Result<(), ValidationError> {
    if !config.meta.enrichment_enabled() {
        return Ok(());
    }

    if config.meta.timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "meta.timeout",
        });
    }
    validate_url("meta.base_url", &config.meta.base_url)
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = reqwest::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate(&AddonConfig::default()), Ok(()));
    }

    #[test]
    fn test_cache_options_require_max_age() {
        let mut config = AddonConfig::default();
        config.cache.stream.etag = true;

        assert_eq!(
            validate(&config),
            Err(ValidationError::CacheOptionWithoutMaxAge {
                kind: ResourceKind::Stream,
                option: "etag",
            })
        );

        config.cache.stream.max_age = HumanDuration::from_secs(60);
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn test_stale_if_error_requires_max_age() {
        let mut config = AddonConfig::default();
        config.cache.subtitles.stale_if_error = HumanDuration::from_secs(60);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::CacheOptionWithoutMaxAge {
                option: "stale_if_error",
                ..
            })
        ));
    }

    #[test]
    fn test_request_logging_combinations() {
        let mut config = AddonConfig::default();
        config.logging.disable_request_logging = true;
        assert_eq!(validate(&config), Ok(()));

        config.logging.log_user_agent = true;
        assert_eq!(
            validate(&config),
            Err(ValidationError::RequestLoggingDisabled {
                option: "log_user_agent"
            })
        );

        config.logging.log_user_agent = false;
        config.meta.log_media_name = true;
        assert_eq!(
            validate(&config),
            Err(ValidationError::RequestLoggingDisabled {
                option: "log_media_name"
            })
        );
    }

    #[test]
    fn test_urls_are_checked() {
        let mut config = AddonConfig::default();
        config.server.redirect_url = Some("not a url".to_string());
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidUrl { field: "server.redirect_url", .. })
        ));

        let mut config = AddonConfig::default();
        config.meta.put_meta_in_context = true;
        config.meta.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidUrl { field: "meta.base_url", .. })
        ));
    }
}
