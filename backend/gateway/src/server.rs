//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use labelguard_analysis::AnalysisPipeline;
use labelguard_catalog::CatalogClient;
use labelguard_history::HistoryStore;

use crate::rate_limit::{self, RateLimiter};
use crate::{analyze, catalog_api, health_api, history_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub history: Arc<HistoryStore>,
    pub catalog: Option<Arc<CatalogClient>>,
    pub rate_limiter: RateLimiter,
    /// Cancelled on shutdown; in-flight analyses observe child tokens.
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(pipeline: AnalysisPipeline, history: HistoryStore) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            history: Arc::new(history),
            catalog: None,
            rate_limiter: RateLimiter::default(),
            shutdown: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }

    pub fn with_catalog(mut self, catalog: CatalogClient) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}

/// Build the router. Analysis routes sit behind the rate limiter and the upload size limit.
pub fn build_router(state: GatewayState, max_upload_bytes: usize) -> Router {
    let analysis = Router::new()
        .route("/api/analyze", post(analyze::analyze_upload))
        .route("/api/products/:id/analyze", post(catalog_api::analyze_product))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::enforce));

    Router::new()
        .route("/api/health", get(health_api::get_health))
        .route("/api/history", get(history_api::get_history))
        .route("/api/analytics", get(history_api::get_analytics))
        .route("/api/products", get(catalog_api::list_products))
        .merge(analysis)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until the state's shutdown token is cancelled.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState, max_upload_bytes: usize) -> Result<()> {
    let shutdown = state.shutdown.clone();

    let limiter = state.rate_limiter.clone();
    let sweep_token = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window);
        loop {
            tokio::select! {
                _ = sweep_token.cancelled() => break,
                _ = interval.tick() => limiter.cleanup().await,
            }
        }
    });

    let app = build_router(state, max_upload_bytes);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway HTTP server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Gateway HTTP server stopped");
    Ok(())
}
