use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;

use super::cache::CachePolicy;
use crate::config::AddonConfig;
use crate::handlers::{HandlerRegistry, ResourceKind};
use crate::metadata::MetaFetcher;
use crate::observability::Metrics;
use crate::types::Manifest;
use crate::userdata::{UserData, UserDataCodec};

/// Callback that may reshape the manifest per request
///
/// It receives a private copy of the manifest and the decoded user data.
/// A status of 400 or above is sent to the client as-is.
pub type ManifestCallback = Arc<dyn Fn(&mut Manifest, &UserData) -> StatusCode + Send + Sync>;

/// Handlers and caching of one resource kind
#[derive(Debug, Clone)]
pub struct ResourceEndpoint {
    pub registry: HandlerRegistry,
    pub cache: CachePolicy,
}

/// Manifest plus its two pre-serialized variants
pub struct ManifestState {
    pub manifest: Manifest,
    /// Body of `/manifest.json`
    pub canonical: Bytes,
    /// Body of `/{userData}/manifest.json`, `configurationRequired` forced off
    pub configured: Bytes,
    pub callback: Option<ManifestCallback>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AddonConfig>,
    pub endpoints: Arc<BTreeMap<ResourceKind, ResourceEndpoint>>,
    pub manifest: Arc<ManifestState>,
    pub codec: Arc<UserDataCodec>,
    pub meta_fetcher: Option<Arc<dyn MetaFetcher>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn endpoint(&self, kind: ResourceKind) -> Option<&ResourceEndpoint> {
        self.endpoints.get(&kind)
    }
}
