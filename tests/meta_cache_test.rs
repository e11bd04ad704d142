use std::sync::Arc;
use std::time::Duration;

use addonbox::metadata::{
    CacheEntry, CinemetaClient, FetchError, FjallMetaCache, InMemoryCache, MediaKind, MetaCache,
    MetaFetcher,
};
use addonbox::types::MetaItem;
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use tokio::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TTL: Duration = Duration::from_secs(60 * 60);

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

fn meta_body(id: &str, kind: &str, name: &str) -> serde_json::Value {
    json!({
        "meta": {
            "id": id,
            "type": kind,
            "name": name,
            "releaseInfo": "2008"
        }
    })
}

fn client(server: &MockServer, cache: Arc<dyn MetaCache>) -> CinemetaClient {
    CinemetaClient::new(server.uri(), Duration::from_secs(2), TTL, cache).unwrap()
}

#[tokio::test]
async fn test_fresh_entry_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/movie/tt1254207.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(meta_body("tt1254207", "movie", "Big Buck Bunny")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCache::new());
    let client = client(&server, cache.clone());

    let first = client.get_movie("tt1254207", deadline()).await.unwrap();
    let second = client.get_movie("tt1254207", deadline()).await.unwrap();

    assert_eq!(first.name, "Big Buck Bunny");
    assert_eq!(first.release_info, "2008");
    assert_eq!(first, second);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_stale_entry_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/movie/tt1254207.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(meta_body("tt1254207", "movie", "Big Buck Bunny")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCache::new());
    cache
        .set(
            "tt1254207",
            CacheEntry {
                value: MetaItem {
                    id: "tt1254207".to_string(),
                    name: "Old name".to_string(),
                    ..Default::default()
                },
                created_at: Utc::now() - chrono::Duration::hours(2),
            },
        )
        .await
        .unwrap();

    let client = client(&server, cache.clone());
    let meta = client.get_movie("tt1254207", deadline()).await.unwrap();
    assert_eq!(meta.name, "Big Buck Bunny");

    let entry = cache.get("tt1254207").await.unwrap().unwrap();
    assert_eq!(entry.value.name, "Big Buck Bunny");
    assert!(!entry.is_stale(TTL));
}

#[tokio::test]
async fn test_episodes_share_series_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/series/tt0944947.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(meta_body("tt0944947", "series", "Game of Thrones")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(InMemoryCache::new()));

    let first = client.get_series("tt0944947", 1, 1, deadline()).await.unwrap();
    let second = client.get_series("tt0944947", 2, 5, deadline()).await.unwrap();

    assert_eq!(first.name, "Game of Thrones");
    assert_eq!(second.name, "Game of Thrones");
}

#[tokio::test]
async fn test_series_document_with_nulls_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/series/tt0944947.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {
                "id": "tt0944947",
                "type": "series",
                "name": "Game of Thrones",
                "releaseInfo": "2011-2019",
                "released": null,
                "trailers": null,
                "behaviorHints": {
                    "defaultVideoId": null,
                    "hasScheduledVideos": false
                },
                "videos": [{
                    "id": "tt0944947:1:1",
                    "name": "Winter Is Coming",
                    "season": 1,
                    "episode": 1,
                    "released": "2011-04-17T05:00:00.000Z",
                    "thumbnail": null,
                    "overview": null
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(InMemoryCache::new()));

    let meta = client.get_series("tt0944947", 1, 1, deadline()).await.unwrap();
    assert_eq!(meta.name, "Game of Thrones");
    assert!(meta.behavior_hints.default_video_id.is_empty());
    assert_eq!(meta.videos.len(), 1);
    assert_eq!(meta.videos[0].season, 1);
}

#[tokio::test]
async fn test_empty_name_is_an_error_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/movie/tt0000001.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meta_body("tt0000001", "movie", "")))
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCache::new());
    let client = client(&server, cache.clone());

    for _ in 0..2 {
        let err = client.get_movie("tt0000001", deadline()).await.unwrap_err();
        assert!(matches!(err, FetchError::EmptyName(MediaKind::Movie)));
    }
    assert_eq!(cache.len().await, 0);
}

#[tokio::test]
async fn test_non_200_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/movie/tt0000002.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(InMemoryCache::new()));

    let err = client.get_movie("tt0000002", deadline()).await.unwrap_err();
    match err {
        FetchError::Status(status) => assert_eq!(status.as_u16(), 404),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/movie/tt0000003.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(InMemoryCache::new()));

    let err = client.get_movie("tt0000003", deadline()).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn test_deadline_bounds_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/movie/tt1254207.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(meta_body("tt1254207", "movie", "Big Buck Bunny"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(InMemoryCache::new()));

    let started = std::time::Instant::now();
    let err = client
        .get_movie("tt1254207", Instant::now() + Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_fjall_cache_survives_reopen() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta/movie/tt1727587.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meta_body("tt1727587", "movie", "Sintel")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("metas.fjall");

    {
        let cache = Arc::new(FjallMetaCache::open(&cache_path).unwrap());
        let client = client(&server, cache.clone());
        let meta = client.get_movie("tt1727587", deadline()).await.unwrap();
        assert_eq!(meta.name, "Sintel");
        cache.persist().unwrap();
    }

    let cache = Arc::new(FjallMetaCache::open(&cache_path).unwrap());
    let client = client(&server, cache);
    let meta = client.get_movie("tt1727587", deadline()).await.unwrap();
    assert_eq!(meta.name, "Sintel");
}
