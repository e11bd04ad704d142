use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::traits::JsonHandler;
use super::types::ResourceKind;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no {kind} handler for media type: {media_type}")]
    NotFound {
        kind: ResourceKind,
        media_type: String,
    },
}

/// Registry mapping media types to the handler of one resource kind
///
/// Filled while the addon is built and read-only afterwards.
#[derive(Clone)]
pub struct HandlerRegistry {
    kind: ResourceKind,
    handlers: BTreeMap<String, Arc<dyn JsonHandler>>,
}

impl HandlerRegistry {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            handlers: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Register a handler, replacing any previous one for the media type
    pub fn register(&mut self, media_type: impl Into<String>, handler: Arc<dyn JsonHandler>) {
        self.handlers.insert(media_type.into(), handler);
    }

    pub fn get(&self, media_type: &str) -> Result<Arc<dyn JsonHandler>, RegistryError> {
        self.handlers
            .get(media_type)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                kind: self.kind,
                media_type: media_type.to_string(),
            })
    }

    pub fn has_handler(&self, media_type: &str) -> bool {
        self.handlers.contains_key(media_type)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kind", &self.kind)
            .field("media_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::traits::{FnHandler, ResourceHandler, Serializing};
    use crate::handlers::{HandlerError, RequestContext, ResourceRequest};
    use crate::types::SubtitleItem;

    fn subtitles_handler() -> Arc<dyn JsonHandler> {
        let handler = FnHandler::new(|_ctx: RequestContext, _req: ResourceRequest| async {
            Ok::<_, HandlerError>(Vec::<SubtitleItem>::new())
        });
        Arc::new(Serializing::new(
            Arc::new(handler) as Arc<dyn ResourceHandler<Vec<SubtitleItem>>>
        ))
    }

    #[test]
    fn test_lookup_by_media_type() {
        let mut registry = HandlerRegistry::new(ResourceKind::Subtitles);
        assert!(registry.is_empty());

        registry.register("movie", subtitles_handler());

        assert!(registry.has_handler("movie"));
        assert!(registry.get("movie").is_ok());
        assert_eq!(registry.media_types().collect::<Vec<_>>(), vec!["movie"]);
    }

    #[test]
    fn test_missing_media_type() {
        let registry = HandlerRegistry::new(ResourceKind::Subtitles);

        match registry.get("series") {
            Err(RegistryError::NotFound { kind, media_type }) => {
                assert_eq!(kind, ResourceKind::Subtitles);
                assert_eq!(media_type, "series");
            }
            Ok(_) => panic!("expected lookup to fail"),
        }
    }
}
