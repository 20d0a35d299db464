//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared, immutable routing state from configuration
//! - Create the Axum Router with the page handler
//! - Wire up middleware (request ID, tracing, timeout, normalization, rewriting)
//! - Bind server to listener and shut down on Ctrl+C

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::cache::{Cache, MemoryCache};
use crate::config::RouterConfig;
use crate::http::handlers;
use crate::http::middleware::{normalize_request, prettify_html, track_metrics};
use crate::http::request::{MakeRequestUuid, RequestIdExt};
use crate::request::RequestNormalizer;
use crate::routing::registry::{ExtensionEntry, Registry};
use crate::routing::rewrite::UrlRewriter;
use crate::security::proxy::ProxyTrustResolver;
use crate::slug::{RedirectPatterns, SlugKind, SlugOptions};
use crate::store::{MessageStore, TitleStore, TopicLocator};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RouterConfig>,
    pub registry: Arc<Registry>,
    pub normalizer: Arc<RequestNormalizer>,
    pub rewriter: Arc<UrlRewriter>,
    pub cache: Arc<dyn Cache>,
    pub slug_options: Arc<SlugOptions>,
    pub patterns: Arc<RedirectPatterns>,
    pub titles: Arc<dyn TitleStore>,
    /// Path of the entry script, stripped to obtain path info.
    pub script_path: String,
}

impl AppState {
    /// Pretty links are emitted only when enabled and the server passes
    /// path info through.
    pub fn pretty_enabled(&self) -> bool {
        self.config.site.pretty_urls && self.config.site.path_info_supported
    }
}

/// Forum data and extensions supplied by the embedding application.
pub struct Collaborators {
    pub cache: Arc<dyn Cache>,
    pub messages: Arc<dyn MessageStore>,
    pub titles: Arc<dyn TitleStore>,
    pub extensions: Vec<ExtensionEntry>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            cache: Arc::new(MemoryCache::new()),
            messages: Arc::new(HashMap::<u64, u64>::new()),
            titles: Arc::new(HashMap::<(SlugKind, u64), String>::new()),
            extensions: Vec::new(),
        }
    }
}

/// HTTP server for the router.
pub struct HttpServer {
    router: Router,
    config: Arc<RouterConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with empty in-memory collaborators.
    pub fn new(config: RouterConfig) -> Self {
        Self::with_collaborators(config, Collaborators::default())
    }

    pub fn with_collaborators(config: RouterConfig, collaborators: Collaborators) -> Self {
        let config = Arc::new(config);
        let state = Self::build_state(config.clone(), collaborators);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    fn build_state(config: Arc<RouterConfig>, collaborators: Collaborators) -> AppState {
        let registry = Arc::new(
            Registry::builder()
                .with_builtin()
                .extend(collaborators.extensions)
                .build(),
        );

        let base_url = config.site.base_url.trim_end_matches('/').to_string();
        let resolver = ProxyTrustResolver::new(&config.proxy.policy, &config.proxy.allowlist);
        let locator = TopicLocator::new(
            collaborators.cache.clone(),
            collaborators.messages,
            config.cache.msg_topic_ttl(),
        );
        let normalizer = RequestNormalizer::new(
            registry.clone(),
            resolver,
            config.site.argument_separator,
            base_url.clone(),
        )
        .with_topic_locator(locator);

        let script_path = Url::parse(&base_url)
            .map(|url| url.path().trim_end_matches('/').to_string())
            .unwrap_or_default();

        AppState {
            registry,
            normalizer: Arc::new(normalizer),
            rewriter: Arc::new(UrlRewriter::new(&base_url)),
            cache: collaborators.cache,
            slug_options: config.slugs.options(),
            patterns: config.slugs.patterns(),
            titles: collaborators.titles,
            script_path,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(handlers::echo))
            .route("/{*path}", any(handlers::echo))
            .layer(middleware::from_fn_with_state(state.clone(), prettify_html))
            .layer(middleware::from_fn_with_state(state.clone(), normalize_request))
            .layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %req.request_id(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_url = %self.config.site.base_url,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
