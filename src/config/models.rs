use crate::api::cache::CacheDirective;
use crate::handlers::ResourceKind;
use crate::humanize::HumanDuration;
use crate::userdata::UserDataEncoding;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddonConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub user_data: UserDataConfig,
    #[serde(default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Deadline handed to resource handlers
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    /// Target of the `/` redirect; no root route when unset
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_timeout: default_request_timeout(),
            redirect_url: None,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

/// HTTP caching per resource kind
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub catalog: ResourceCacheConfig,
    #[serde(default)]
    pub stream: ResourceCacheConfig,
    #[serde(default)]
    pub meta: ResourceCacheConfig,
    #[serde(default)]
    pub subtitles: ResourceCacheConfig,
}

impl CacheConfig {
    pub fn for_kind(&self, kind: ResourceKind) -> &ResourceCacheConfig {
        match kind {
            ResourceKind::Catalog => &self.catalog,
            ResourceKind::Stream => &self.stream,
            ResourceKind::Meta => &self.meta,
            ResourceKind::Subtitles => &self.subtitles,
        }
    }

    pub fn for_kind_mut(&mut self, kind: ResourceKind) -> &mut ResourceCacheConfig {
        match kind {
            ResourceKind::Catalog => &mut self.catalog,
            ResourceKind::Stream => &mut self.stream,
            ResourceKind::Meta => &mut self.meta,
            ResourceKind::Subtitles => &mut self.subtitles,
        }
    }
}

/// Caching options of one resource kind. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceCacheConfig {
    #[serde(default)]
    pub max_age: HumanDuration,
    #[serde(default)]
    pub stale_while_revalidate: HumanDuration,
    #[serde(default)]
    pub stale_if_error: HumanDuration,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub etag: bool,
}

impl ResourceCacheConfig {
    pub fn directive(&self) -> CacheDirective {
        CacheDirective {
            max_age: self.max_age.as_duration(),
            public: self.public,
            stale_while_revalidate: self.stale_while_revalidate.as_duration(),
            stale_if_error: self.stale_if_error.as_duration(),
            etag: self.etag,
        }
    }
}

/// Transport encoding of structured user data
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserDataConfig {
    #[serde(default)]
    pub encoding: UserDataEncoding,
}

/// Stream enrichment and the metadata fetcher behind it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetaConfig {
    /// Log the movie or series name with each stream request
    #[serde(default)]
    pub log_media_name: bool,
    /// Hand the looked-up metadata to stream handlers
    #[serde(default)]
    pub put_meta_in_context: bool,
    #[serde(default = "default_meta_base_url")]
    pub base_url: String,
    #[serde(default = "default_meta_timeout")]
    pub timeout: HumanDuration,
    #[serde(default = "default_meta_ttl")]
    pub ttl: HumanDuration,
    /// Persistent cache location; in-memory cache when unset
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

impl MetaConfig {
    pub fn enrichment_enabled(&self) -> bool {
        self.log_media_name || self.put_meta_in_context
    }
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            log_media_name: false,
            put_meta_in_context: false,
            base_url: default_meta_base_url(),
            timeout: default_meta_timeout(),
            ttl: default_meta_ttl(),
            cache_path: None,
        }
    }
}

fn default_meta_base_url() -> String {
    "https://v3-cinemeta.strem.io".to_string()
}

fn default_meta_timeout() -> HumanDuration {
    HumanDuration::from_secs(2)
}

fn default_meta_ttl() -> HumanDuration {
    HumanDuration::from_secs(30 * 24 * 60 * 60)
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub disable_request_logging: bool,
    #[serde(default)]
    pub log_ips: bool,
    #[serde(default)]
    pub log_user_agent: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            disable_request_logging: false,
            log_ips: false,
            log_user_agent: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
