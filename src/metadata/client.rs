//! Cinemeta client with a TTL cache in front

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error};

use super::cache::{CacheEntry, MetaCache};
use crate::config::MetaConfig;
use crate::types::MetaItem;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected response status: {0}")]
    Status(StatusCode),

    #[error("Couldn't decode response body: {0}")]
    Decode(String),

    #[error("Couldn't find {0} name in response")]
    EmptyName(MediaKind),
}

/// The two media kinds metadata can be fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of movie and series metadata
///
/// `deadline` bounds the lookup; implementations may give up earlier.
#[async_trait]
pub trait MetaFetcher: Send + Sync {
    async fn get_movie(&self, imdb_id: &str, deadline: Instant) -> Result<MetaItem, FetchError>;

    async fn get_series(
        &self,
        imdb_id: &str,
        season: u32,
        episode: u32,
        deadline: Instant,
    ) -> Result<MetaItem, FetchError>;
}

#[derive(Deserialize)]
struct MetaResponse {
    meta: MetaItem,
}

/// Cinemeta client
///
/// Lookups are served from the cache while the entry is younger than the
/// TTL. Otherwise metadata is fetched once (no retries) and stored.
pub struct CinemetaClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    ttl: Duration,
    cache: Arc<dyn MetaCache>,
}

impl CinemetaClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        ttl: Duration,
        cache: Arc<dyn MetaCache>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("addonbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            ttl,
            cache,
        })
    }

    pub fn from_config(config: &MetaConfig, cache: Arc<dyn MetaCache>) -> Result<Self, FetchError> {
        Self::new(
            config.base_url.clone(),
            config.timeout.as_duration(),
            config.ttl.as_duration(),
            cache,
        )
    }

    async fn get_meta(
        &self,
        kind: MediaKind,
        imdb_id: &str,
        deadline: Instant,
    ) -> Result<MetaItem, FetchError> {
        match self.cache.get(imdb_id).await {
            Ok(Some(entry)) if !entry.is_stale(self.ttl) => {
                debug!(imdb_id, "Hit cache for meta, returning result");
                return Ok(entry.value);
            }
            Ok(Some(entry)) => {
                debug!(
                    imdb_id,
                    expired_since = ?entry.age().saturating_sub(self.ttl),
                    "Hit cache for meta, but item is expired"
                );
            }
            Ok(None) => debug!(imdb_id, "Meta not found in cache"),
            // Unreadable entries are refetched and overwritten
            Err(e) => error!(imdb_id, error = %e, "Couldn't read meta from cache"),
        }

        let meta = self.fetch(kind, imdb_id, deadline).await?;

        if let Err(e) = self.cache.set(imdb_id, CacheEntry::new(meta.clone())).await {
            error!(imdb_id, error = %e, "Couldn't cache meta");
        }

        Ok(meta)
    }

    async fn fetch(
        &self,
        kind: MediaKind,
        imdb_id: &str,
        deadline: Instant,
    ) -> Result<MetaItem, FetchError> {
        let url = format!("{}/meta/{}/{}.json", self.base_url, kind, imdb_id);
        debug!(url = %url, "Fetching meta");

        // The client timeout caps the caller's deadline
        let deadline = deadline.min(Instant::now() + self.timeout);

        let request = async {
            let response = self.client.get(&url).send().await.map_err(map_request_error)?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(FetchError::Status(status));
            }

            let body = response.bytes().await.map_err(map_request_error)?;
            serde_json::from_slice::<MetaResponse>(&body)
                .map_err(|e| FetchError::Decode(e.to_string()))
        };

        let response = tokio::time::timeout_at(deadline, request)
            .await
            .map_err(|_| FetchError::Timeout)??;

        if response.meta.name.is_empty() {
            return Err(FetchError::EmptyName(kind));
        }

        Ok(response.meta)
    }
}

#[async_trait]
impl MetaFetcher for CinemetaClient {
    async fn get_movie(&self, imdb_id: &str, deadline: Instant) -> Result<MetaItem, FetchError> {
        self.get_meta(MediaKind::Movie, imdb_id, deadline).await
    }

    // Episodes share the series document, so the cache key is the show id
    async fn get_series(
        &self,
        imdb_id: &str,
        season: u32,
        episode: u32,
        deadline: Instant,
    ) -> Result<MetaItem, FetchError> {
        debug!(imdb_id, season, episode, "Looking up series meta");
        self.get_meta(MediaKind::Series, imdb_id, deadline).await
    }
}

fn map_request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_decode() {
        FetchError::Decode(e.to_string())
    } else {
        FetchError::Request(e.to_string())
    }
}
