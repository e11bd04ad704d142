use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::MetaItem;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Fjall error: {0}")]
    Store(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cached metadata together with the time it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: MetaItem,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(value: MetaItem) -> Self {
        Self {
            value,
            created_at: Utc::now(),
        }
    }

    /// Age of the entry, zero if `created_at` lies in the future
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }
}

/// Storage behind the metadata fetcher
///
/// Stale entries are never evicted; the next successful fetch overwrites
/// them.
#[async_trait]
pub trait MetaCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;
}

/// Process-local cache, lost on restart
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl MetaCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }
}

/// Fjall-backed cache that survives restarts
#[derive(Clone)]
pub struct FjallMetaCache {
    keyspace: Keyspace,
    metas: PartitionHandle,
}

impl FjallMetaCache {
    /// Open or create a cache at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        info!("Opening meta cache at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let metas = keyspace.open_partition("metas", PartitionCreateOptions::default())?;

        Ok(Self { keyspace, metas })
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<(), CacheError> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl MetaCache for FjallMetaCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        match self.metas.get(key.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let value = serde_json::to_vec(&entry)?;
        self.metas.insert(key.as_bytes(), value)?;
        debug!(key, "Stored meta in cache");
        Ok(())
    }
}
