//! Addon assembly
//!
//! [`Addon::builder`] collects the manifest, the resource handlers and the
//! configuration. [`AddonBuilder::build`] validates the combination once and
//! freezes everything the request path needs: handler registries, cache
//! header values and the serialized manifest variants.

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use crate::api::{
    self,
    cache::CachePolicy,
    state::{AppState, ManifestCallback, ManifestState, ResourceEndpoint},
};
use crate::config::{AddonConfig, ValidationError};
use crate::handlers::{
    FnHandler, HandlerError, HandlerRegistry, RequestContext, ResourceHandler, ResourceKind,
    ResourceRequest, Serializing,
};
use crate::metadata::{self, MetaFetcher, MetadataError};
use crate::observability::Metrics;
use crate::types::{Manifest, MetaItem, MetaPreviewItem, StreamItem, SubtitleItem};
use crate::userdata::{DecodeError, UserData, UserDataCodec};

#[derive(Debug, Error)]
pub enum AddonError {
    #[error("manifest field '{0}' must not be empty")]
    EmptyManifestField(&'static str),

    #[error("no resource handlers registered")]
    NoHandlers,

    #[error("configurationRequired requires the manifest to be configurable")]
    ConfigurationRequiredNotConfigurable,

    #[error("a custom meta fetcher is only used when meta.log_media_name or meta.put_meta_in_context is enabled")]
    UnusedMetaFetcher,

    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("couldn't serialize manifest: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A fully assembled addon
pub struct Addon {
    state: AppState,
}

impl Addon {
    pub fn builder(manifest: Manifest) -> AddonBuilder {
        AddonBuilder::new(manifest)
    }

    /// Router serving the addon
    ///
    /// Merge further routes or add layers before serving it.
    pub fn router(&self) -> Router {
        api::build_router(self.state.clone())
    }

    /// Decode a user-data segment the same way resource routes do
    pub fn decode_user_data(&self, segment: &str) -> Result<UserData, DecodeError> {
        self.state.codec.decode(segment)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.state.manifest.manifest
    }

    pub fn config(&self) -> &AddonConfig {
        &self.state.config
    }

    /// Serve on `server.bind_addr` until Ctrl+C or SIGTERM
    pub async fn run(&self) -> std::io::Result<()> {
        self.run_on(self.state.config.server.bind_addr).await
    }

    pub async fn run_on(&self, address: SocketAddr) -> std::io::Result<()> {
        api::run(address, self.router()).await
    }
}

pub struct AddonBuilder {
    manifest: Manifest,
    registries: BTreeMap<ResourceKind, HandlerRegistry>,
    codec: UserDataCodec,
    manifest_callback: Option<ManifestCallback>,
    meta_fetcher: Option<Arc<dyn MetaFetcher>>,
    config: AddonConfig,
}

impl AddonBuilder {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            registries: BTreeMap::new(),
            codec: UserDataCodec::raw(),
            manifest_callback: None,
            meta_fetcher: None,
            config: AddonConfig::default(),
        }
    }

    pub fn config(mut self, config: AddonConfig) -> Self {
        self.config = config;
        self
    }

    /// Decode user data into `T` instead of passing it through raw
    ///
    /// The transport encoding comes from `user_data.encoding`.
    pub fn user_data<T>(mut self) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.codec = UserDataCodec::typed::<T>(Default::default());
        self
    }

    pub fn manifest_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Manifest, &UserData) -> StatusCode + Send + Sync + 'static,
    {
        self.manifest_callback = Some(Arc::new(callback));
        self
    }

    /// Replace the default Cinemeta client used for stream enrichment
    pub fn meta_fetcher(mut self, fetcher: Arc<dyn MetaFetcher>) -> Self {
        self.meta_fetcher = Some(fetcher);
        self
    }

    pub fn catalog<F, Fut>(self, media_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(RequestContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<MetaPreviewItem>, HandlerError>> + Send + 'static,
    {
        self.catalog_handler(media_type, Arc::new(FnHandler::new(f)))
    }

    pub fn catalog_handler(
        self,
        media_type: impl Into<String>,
        handler: Arc<dyn ResourceHandler<Vec<MetaPreviewItem>>>,
    ) -> Self {
        self.register(ResourceKind::Catalog, media_type, handler)
    }

    pub fn stream<F, Fut>(self, media_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(RequestContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<StreamItem>, HandlerError>> + Send + 'static,
    {
        self.stream_handler(media_type, Arc::new(FnHandler::new(f)))
    }

    pub fn stream_handler(
        self,
        media_type: impl Into<String>,
        handler: Arc<dyn ResourceHandler<Vec<StreamItem>>>,
    ) -> Self {
        self.register(ResourceKind::Stream, media_type, handler)
    }

    pub fn meta<F, Fut>(self, media_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(RequestContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MetaItem, HandlerError>> + Send + 'static,
    {
        self.meta_handler(media_type, Arc::new(FnHandler::new(f)))
    }

    pub fn meta_handler(
        self,
        media_type: impl Into<String>,
        handler: Arc<dyn ResourceHandler<MetaItem>>,
    ) -> Self {
        self.register(ResourceKind::Meta, media_type, handler)
    }

    pub fn subtitles<F, Fut>(self, media_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(RequestContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<SubtitleItem>, HandlerError>> + Send + 'static,
    {
        self.subtitles_handler(media_type, Arc::new(FnHandler::new(f)))
    }

    pub fn subtitles_handler(
        self,
        media_type: impl Into<String>,
        handler: Arc<dyn ResourceHandler<Vec<SubtitleItem>>>,
    ) -> Self {
        self.register(ResourceKind::Subtitles, media_type, handler)
    }

    fn register<T>(
        mut self,
        kind: ResourceKind,
        media_type: impl Into<String>,
        handler: Arc<dyn ResourceHandler<T>>,
    ) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.registries
            .entry(kind)
            .or_insert_with(|| HandlerRegistry::new(kind))
            .register(media_type, Arc::new(Serializing::new(handler)));
        self
    }

    pub fn build(self) -> Result<Addon, AddonError> {
        self.validate()?;

        let AddonBuilder {
            manifest,
            registries,
            codec,
            manifest_callback,
            meta_fetcher,
            config,
        } = self;

        let meta_fetcher = match meta_fetcher {
            Some(fetcher) => Some(fetcher),
            None if config.meta.enrichment_enabled() => {
                info!(base_url = %config.meta.base_url, "Using Cinemeta for stream enrichment");
                Some(Arc::new(metadata::cinemeta_from_config(&config.meta)?) as Arc<dyn MetaFetcher>)
            }
            None => None,
        };

        let endpoints: BTreeMap<_, _> = registries
            .into_iter()
            .map(|(kind, registry)| {
                let cache = CachePolicy::new(&config.cache.for_kind(kind).directive());
                (kind, ResourceEndpoint { registry, cache })
            })
            .collect();

        let manifest_state = ManifestState {
            canonical: Bytes::from(serde_json::to_vec(&manifest)?),
            configured: Bytes::from(serde_json::to_vec(&manifest.configured())?),
            manifest,
            callback: manifest_callback,
        };

        let codec = codec.with_encoding(config.user_data.encoding);

        Ok(Addon {
            state: AppState {
                config: Arc::new(config),
                endpoints: Arc::new(endpoints),
                manifest: Arc::new(manifest_state),
                codec: Arc::new(codec),
                meta_fetcher,
                metrics: Arc::new(Metrics::new()),
            },
        })
    }

    fn validate(&self) -> Result<(), AddonError> {
        let manifest = &self.manifest;
        for (field, value) in [
            ("id", &manifest.id),
            ("name", &manifest.name),
            ("description", &manifest.description),
            ("version", &manifest.version),
        ] {
            if value.is_empty() {
                return Err(AddonError::EmptyManifestField(field));
            }
        }

        if self.registries.values().all(HandlerRegistry::is_empty) {
            return Err(AddonError::NoHandlers);
        }

        let hints = &manifest.behavior_hints;
        if hints.configuration_required && !hints.configurable {
            return Err(AddonError::ConfigurationRequiredNotConfigurable);
        }

        self.config.validate()?;

        if self.meta_fetcher.is_some() && !self.config.meta.enrichment_enabled() {
            return Err(AddonError::UnusedMetaFetcher);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    fn manifest() -> Manifest {
        Manifest {
            id: "com.example.test".to_string(),
            name: "Test".to_string(),
            description: "Test addon".to_string(),
            version: "0.1.0".to_string(),
            ..Default::default()
        }
    }

    fn with_stream(builder: AddonBuilder) -> AddonBuilder {
        builder.stream("movie", |_ctx, _req| async { Ok(Vec::new()) })
    }

    #[test]
    fn test_minimal_addon_builds() {
        let addon = with_stream(Addon::builder(manifest())).build().unwrap();
        assert_eq!(addon.manifest().id, "com.example.test");
    }

    #[test]
    fn test_empty_manifest_fields_are_rejected() {
        let mut m = manifest();
        m.version.clear();

        let err = with_stream(Addon::builder(m)).build().err().unwrap();
        assert!(matches!(err, AddonError::EmptyManifestField("version")));
    }

    #[test]
    fn test_no_handlers_is_rejected() {
        let err = Addon::builder(manifest()).build().err().unwrap();
        assert!(matches!(err, AddonError::NoHandlers));
    }

    #[test]
    fn test_configuration_required_needs_configurable() {
        let mut m = manifest();
        m.behavior_hints.configuration_required = true;

        let err = with_stream(Addon::builder(m.clone())).build().err().unwrap();
        assert!(matches!(err, AddonError::ConfigurationRequiredNotConfigurable));

        m.behavior_hints.configurable = true;
        assert!(with_stream(Addon::builder(m)).build().is_ok());
    }

    #[test]
    fn test_cache_options_need_max_age() {
        let mut config = AddonConfig::default();
        config.cache.catalog.stale_while_revalidate = HumanDuration::from_secs(60);

        let err = with_stream(Addon::builder(manifest()).config(config))
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AddonError::Config(ValidationError::CacheOptionWithoutMaxAge { .. })
        ));
    }

    #[test]
    fn test_logging_options_need_request_logging() {
        let mut config = AddonConfig::default();
        config.logging.disable_request_logging = true;
        config.logging.log_ips = true;

        let err = with_stream(Addon::builder(manifest()).config(config))
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AddonError::Config(ValidationError::RequestLoggingDisabled { option: "log_ips" })
        ));
    }

    #[test]
    fn test_unused_meta_fetcher_is_rejected() {
        let fetcher = metadata::CinemetaClient::new(
            "http://localhost:1",
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(60),
            Arc::new(metadata::InMemoryCache::new()),
        )
        .unwrap();

        let err = with_stream(Addon::builder(manifest()))
            .meta_fetcher(Arc::new(fetcher))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AddonError::UnusedMetaFetcher));
    }

    #[test]
    fn test_decode_user_data_uses_configured_encoding() {
        #[derive(serde::Deserialize)]
        struct Settings {
            token: String,
        }

        let mut config = AddonConfig::default();
        config.user_data.encoding = crate::userdata::UserDataEncoding::Base64;

        let addon = with_stream(Addon::builder(manifest()))
            .user_data::<Settings>()
            .config(config)
            .build()
            .unwrap();

        // base64url of {"token":"abc"}
        let decoded = addon.decode_user_data("eyJ0b2tlbiI6ImFiYyJ9").unwrap();
        assert_eq!(decoded.typed::<Settings>().unwrap().token, "abc");
        assert!(addon.decode_user_data("%7B%7D").is_err());
    }
}
