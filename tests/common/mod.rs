//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use pretty_router::cache::MemoryCache;
use pretty_router::config::RouterConfig;
use pretty_router::http::{Collaborators, HttpServer};
use pretty_router::slug::SlugKind;

pub const BASE: &str = "https://forum.example.com/index.php";

/// Config pointing at [`BASE`] with pretty URLs on.
#[allow(dead_code)]
pub fn test_config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.site.base_url = BASE.to_string();
    config
}

/// Forum with topic 42 ("My Great Topic"), board 2 ("General Discussion")
/// and message 77 in topic 9.
#[allow(dead_code)]
pub fn forum() -> (Arc<MemoryCache>, Collaborators) {
    let cache = Arc::new(MemoryCache::new());
    let titles = HashMap::from([
        ((SlugKind::Topic, 42u64), "My Great Topic".to_string()),
        ((SlugKind::Board, 2u64), "General Discussion".to_string()),
    ]);
    let collaborators = Collaborators {
        cache: cache.clone(),
        messages: Arc::new(HashMap::from([(77u64, 9u64)])),
        titles: Arc::new(titles),
        extensions: Vec::new(),
    };
    (cache, collaborators)
}

#[allow(dead_code)]
pub fn app(config: RouterConfig) -> Router {
    let (_, collaborators) = forum();
    HttpServer::with_collaborators(config, collaborators).router()
}

/// Sends one request through the router in-process.
#[allow(dead_code)]
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[allow(dead_code)]
pub async fn get(router: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}
