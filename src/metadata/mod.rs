//! Movie and series metadata for stream requests
//!
//! When enabled, stream requests for IMDb ids are enriched with metadata
//! before the handler runs, either to log the media name or to hand the
//! metadata to the handler through [`RequestContext::meta`].
//!
//! [`RequestContext::meta`]: crate::handlers::RequestContext::meta

mod cache;
mod client;

pub use cache::{CacheEntry, CacheError, FjallMetaCache, InMemoryCache, MetaCache};
pub use client::{CinemetaClient, FetchError, MediaKind, MetaFetcher};

use std::sync::Arc;

use tokio::time::Instant;

use crate::config::MetaConfig;
use crate::types::MetaItem;

/// Media a stream request refers to, parsed from its type and id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef<'a> {
    Movie { imdb_id: &'a str },
    Episode { imdb_id: &'a str, season: u32, episode: u32 },
}

impl<'a> MediaRef<'a> {
    /// Parse `tt…` movie ids and `tt…:season:episode` episode ids
    ///
    /// Anything else (other media types, non-IMDb ids) is not looked up.
    pub fn parse(media_type: &str, id: &'a str) -> Option<Self> {
        match media_type {
            "movie" => {
                let imdb_id = id.split(':').next()?;
                is_imdb_id(imdb_id).then_some(MediaRef::Movie { imdb_id })
            }
            "series" => {
                let mut parts = id.split(':');
                let imdb_id = parts.next()?;
                let season = parts.next()?.parse().ok()?;
                let episode = parts.next()?.parse().ok()?;
                if parts.next().is_some() || !is_imdb_id(imdb_id) {
                    return None;
                }
                Some(MediaRef::Episode {
                    imdb_id,
                    season,
                    episode,
                })
            }
            _ => None,
        }
    }

    pub async fn fetch(
        &self,
        fetcher: &dyn MetaFetcher,
        deadline: Instant,
    ) -> Result<MetaItem, FetchError> {
        match *self {
            MediaRef::Movie { imdb_id } => fetcher.get_movie(imdb_id, deadline).await,
            MediaRef::Episode {
                imdb_id,
                season,
                episode,
            } => fetcher.get_series(imdb_id, season, episode, deadline).await,
        }
    }
}

fn is_imdb_id(id: &str) -> bool {
    id.strip_prefix("tt")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Build the Cinemeta client described by `config`
///
/// Uses the persistent cache when `cache_path` is set.
pub fn cinemeta_from_config(config: &MetaConfig) -> Result<CinemetaClient, MetadataError> {
    let cache: Arc<dyn MetaCache> = match &config.cache_path {
        Some(path) => Arc::new(FjallMetaCache::open(path)?),
        None => Arc::new(InMemoryCache::new()),
    };

    Ok(CinemetaClient::from_config(config, cache)?)
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Couldn't open meta cache: {0}")]
    Cache(#[from] CacheError),

    #[error("Couldn't create meta client: {0}")]
    Client(#[from] FetchError),
}
