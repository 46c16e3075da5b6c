//! End-to-end tests: real Unsplash client against a mock server.

use std::sync::Arc;

use gallery_feed::{
    ErrorKind, FeedController, FeedEvent, ImageCache, ImageLoader, ImageSlot, PhotoSource,
    SlotContent, UnsplashClient,
};
use tokio::runtime::Handle;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn photo_json(server: &MockServer, id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "created_at": "2026-02-17T10:00:00Z",
        "description": null,
        "alt_description": format!("photo {id}"),
        "urls": {
            "raw": format!("{}/img/{id}/raw", server.uri()),
            "full": format!("{}/img/{id}/full", server.uri()),
            "regular": format!("{}/img/{id}/regular", server.uri()),
            "small": format!("{}/img/{id}/small", server.uri()),
            "thumb": format!("{}/img/shared/thumb", server.uri())
        },
        "user": { "name": "Tester", "username": "tester" }
    })
}

async fn mount_page(server: &MockServer, page: u32, ids: &[&str]) {
    let body: Vec<_> = ids.iter().map(|id| photo_json(server, id)).collect();
    Mock::given(method("GET"))
        .and(path("/photos"))
        .and(query_param("page", page.to_string()))
        .and(header("Authorization", "Client-ID test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> Arc<UnsplashClient> {
    Arc::new(UnsplashClient::new(Some("test-key".to_string())).with_base_url(server.uri()))
}

#[tokio::test]
async fn test_pages_append_in_order() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &["a", "b"]).await;
    mount_page(&server, 2, &["c"]).await;

    let mut feed = FeedController::new(client_for(&server), Handle::current());

    assert!(feed.load_next_page());
    let events = feed.settle().await;
    assert_eq!(events, vec![FeedEvent::LoadingStarted, FeedEvent::Updated]);

    assert!(feed.load_next_page());
    let events = feed.settle().await;
    assert_eq!(events, vec![FeedEvent::Updated]);

    let ids: Vec<&str> = feed.items().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(feed.page_cursor(), 3);
    assert_eq!(feed.items()[0].author.username, "tester");
}

#[tokio::test]
async fn test_unauthorized_page_keeps_loaded_items() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &["a"]).await;
    Mock::given(method("GET"))
        .and(path("/photos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut feed = FeedController::new(client_for(&server), Handle::current());
    feed.load_next_page();
    feed.settle().await;

    feed.load_next_page();
    let events = feed.settle().await;
    assert_eq!(
        events,
        vec![FeedEvent::Failed {
            kind: ErrorKind::Unauthorized,
            message: ErrorKind::Unauthorized.user_message().to_string(),
        }]
    );
    assert_eq!(feed.len(), 1);
    assert_eq!(feed.page_cursor(), 2);
    assert_eq!(feed.last_error(), Some(ErrorKind::Unauthorized));
    assert!(!feed.is_loading());
}

#[tokio::test]
async fn test_missing_key_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Arc::new(UnsplashClient::new(None).with_base_url(server.uri()));
    let mut feed = FeedController::new(client, Handle::current());
    feed.load_next_page();
    let events = feed.settle().await;

    assert!(matches!(
        events.last(),
        Some(FeedEvent::Failed {
            kind: ErrorKind::MissingAccessKey,
            ..
        })
    ));
    assert!(feed.is_empty());
}

#[tokio::test]
async fn test_shared_thumbnail_downloads_once() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &["a", "b", "c"]).await;
    Mock::given(method("GET"))
        .and(path("/img/shared/thumb"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"thumb-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let source = client_for(&server);
    let mut feed = FeedController::new(Arc::clone(&source), Handle::current());
    feed.load_next_page();
    feed.settle().await;

    let cache = Arc::new(ImageCache::new());
    let mut loader = ImageLoader::new(source, Arc::clone(&cache), Handle::current(), 2);
    let mut slots: Vec<ImageSlot> = (0..feed.len()).map(ImageSlot::new).collect();
    for (slot, photo) in slots.iter_mut().zip(feed.items()) {
        loader.request(slot, photo.thumbnail_url());
    }
    while let Some(loaded) = loader.next_loaded().await {
        let id = loaded.slot;
        assert!(slots[id].apply(loaded));
    }

    for slot in &slots {
        match slot.content() {
            SlotContent::Ready(bytes) => assert_eq!(&bytes[..], b"thumb-bytes"),
            other => panic!("slot {} not ready: {:?}", slot.id(), other),
        }
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().misses, 1);

    // A later request for the same thumbnail is served from memory
    let mut extra = ImageSlot::new(99);
    loader.request(&mut extra, feed.items()[0].thumbnail_url());
    assert!(matches!(extra.content(), SlotContent::Ready(_)));
    assert_eq!(loader.pending(), 0);
}

#[tokio::test]
async fn test_missing_image_is_reported_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let cache = ImageCache::new();
    let source = client_for(&server);
    let url = format!("{}/img/gone", server.uri());

    let first = cache
        .get_or_fetch(&url, |u| {
            let source = Arc::clone(&source);
            async move { source.fetch_bytes(&u).await }
        })
        .await;
    assert_eq!(assert_err!(first), ErrorKind::Network);
    assert!(!cache.contains(&url));

    let second = cache
        .get_or_fetch(&url, |u| {
            let source = Arc::clone(&source);
            async move { source.fetch_bytes(&u).await }
        })
        .await;
    assert_err!(second);
    assert_eq!(cache.stats().failures, 2);
}

#[tokio::test]
async fn test_refresh_restarts_from_first_page() {
    let server = MockServer::start().await;
    let body = serde_json::json!([photo_json(&server, "a")]);
    Mock::given(method("GET"))
        .and(path("/photos"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(2)
        .mount(&server)
        .await;

    let mut feed = FeedController::new(client_for(&server), Handle::current());
    feed.load_next_page();
    feed.settle().await;
    assert!(feed.refresh());
    let events = feed.settle().await;

    assert_eq!(events, vec![FeedEvent::LoadingStarted, FeedEvent::Updated]);
    assert_eq!(feed.len(), 1);
    assert_eq!(feed.page_cursor(), 2);
    let first = assert_ok!(feed.item_at(0).ok_or("feed is empty"));
    assert_eq!(first.id, "a");
}
