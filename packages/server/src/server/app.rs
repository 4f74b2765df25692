//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use harvester::fetchers::HttpFetcher;
use harvester::gateways::CloudflareGateway;
use harvester::searchers::{DomainSearcher, TavilySearcher};
use harvester::security::ExposeSecret;
use harvester::{Harvester, LlmGateway, PageFetcher, WebSearcher};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::server::routes::{
    content_handler, enqueue_handler, health_handler, knowledge_handler, process_handler,
    status_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub harvester: Arc<Harvester>,
}

/// Build the harvester and its collaborators from configuration
///
/// Uses Cloudflare Workers AI when credentials are present, otherwise
/// every page goes through fallback extraction. Uses Tavily for topic
/// search when a key is present, otherwise the domain site searches.
pub fn build_harvester(config: &Config) -> Arc<Harvester> {
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new());

    let searcher: Arc<dyn WebSearcher> = match &config.tavily_api_key {
        Some(key) => {
            tracing::info!("Using Tavily for topic search");
            Arc::new(TavilySearcher::new(key.expose_secret()))
        }
        None => {
            tracing::info!("TAVILY_API_KEY not set, searching programming domains directly");
            Arc::new(DomainSearcher::new(fetcher.clone()))
        }
    };

    let gateway: Option<Arc<dyn LlmGateway>> = match config.cloudflare_credentials() {
        Some(credentials) => {
            tracing::info!(account_id = %credentials.account_id, "Using Cloudflare Workers AI for extraction");
            Some(Arc::new(
                CloudflareGateway::new(credentials).with_timeout(config.harvester.llm_timeout),
            ))
        }
        None => {
            tracing::warn!("Missing Cloudflare credentials, extraction will use fallback records");
            None
        }
    };

    Arc::new(Harvester::new(
        config.harvester.clone(),
        fetcher,
        searcher,
        gateway,
    ))
}

/// Build the Axum application router
pub fn build_app(harvester: Arc<Harvester>) -> Router {
    let app_state = AppState { harvester };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        // Learning API
        .route("/api/learning/enqueue", post(enqueue_handler))
        .route("/api/learning/process", post(process_handler))
        .route("/api/learning/content", post(content_handler))
        .route("/api/learning/status", get(status_handler))
        .route("/api/learning/knowledge", get(knowledge_handler))
        // Health check
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
