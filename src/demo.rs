//! Bundled example addon: free movies made with Blender

use addonbox::config::{AddonConfig, HumanDuration};
use addonbox::handlers::{HandlerError, RequestContext, ResourceKind, ResourceRequest};
use addonbox::types::{CatalogItem, Manifest, MetaPreviewItem, ResourceItem, StreamItem};

/// The catalog and the streams never change, so both may be cached for a day
/// unless the configuration says otherwise.
pub fn apply_cache_defaults(config: &mut AddonConfig) {
    for kind in [ResourceKind::Catalog, ResourceKind::Stream] {
        let cache = config.cache.for_kind_mut(kind);
        if cache.max_age.is_zero() {
            cache.max_age = HumanDuration::from_secs(24 * 60 * 60);
            cache.public = true;
            cache.etag = true;
        }
    }
}

pub fn manifest() -> Manifest {
    Manifest {
        id: "com.example.blender".to_string(),
        name: "Blender movies".to_string(),
        description: "Catalog and streams for free movies that were made with Blender".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        resources: vec![
            ResourceItem {
                name: "catalog".to_string(),
                ..Default::default()
            },
            ResourceItem {
                name: "stream".to_string(),
                types: vec!["movie".to_string()],
                id_prefixes: vec!["tt".to_string()],
            },
        ],
        types: vec!["movie".to_string()],
        catalogs: vec![CatalogItem {
            kind: "movie".to_string(),
            id: "blender".to_string(),
            name: "Free movies made with Blender".to_string(),
            extra: Vec::new(),
        }],
        id_prefixes: vec!["tt".to_string()],
        ..Default::default()
    }
}

pub async fn movie_catalog(
    _ctx: RequestContext,
    request: ResourceRequest,
) -> Result<Vec<MetaPreviewItem>, HandlerError> {
    if request.id != "blender" {
        return Err(HandlerError::NotFound);
    }

    Ok(vec![
        MetaPreviewItem {
            id: "tt1254207".to_string(),
            kind: "movie".to_string(),
            name: "Big Buck Bunny".to_string(),
            poster: "https://upload.wikimedia.org/wikipedia/commons/thumb/c/c5/Big_buck_bunny_poster_big.jpg/339px-Big_buck_bunny_poster_big.jpg".to_string(),
            ..Default::default()
        },
        MetaPreviewItem {
            id: "tt1727587".to_string(),
            kind: "movie".to_string(),
            name: "Sintel".to_string(),
            poster: "https://images.metahub.space/poster/small/tt1727587/img".to_string(),
            ..Default::default()
        },
    ])
}

pub async fn movie_streams(
    ctx: RequestContext,
    request: ResourceRequest,
) -> Result<Vec<StreamItem>, HandlerError> {
    if let Some(meta) = &ctx.meta {
        tracing::debug!(name = %meta.name, "Serving streams");
    }

    match request.id.as_str() {
        "tt1254207" => Ok(vec![
            StreamItem {
                info_hash: "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c".to_string(),
                file_index: 1,
                title: "1080p (torrent)".to_string(),
                ..Default::default()
            },
            StreamItem {
                url: "https://ftp.halifax.rwth-aachen.de/blender/demo/movies/BBB/bbb_sunflower_1080p_30fps_normal.mp4".to_string(),
                title: "1080p (HTTP stream)".to_string(),
                ..Default::default()
            },
        ]),
        "tt1727587" => Ok(vec![
            StreamItem {
                info_hash: "08ada5a7a6183aae1e09d831df6748d566095a10".to_string(),
                title: "480p (torrent)".to_string(),
                ..Default::default()
            },
            StreamItem {
                url: "https://ftp.halifax.rwth-aachen.de/blender/demo/movies/Sintel.2010.1080p.mkv".to_string(),
                title: "1080p (HTTP stream)".to_string(),
                ..Default::default()
            },
        ]),
        _ => Err(HandlerError::NotFound),
    }
}
