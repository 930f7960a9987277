//! Gateway Rate Limiting Module
//!
//! Fixed-window request counter per client, applied to the analysis routes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Clone)]
pub struct RateLimiter {
    // client key -> (request_count, window_start)
    limits: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(30, 60)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Count a request from `client`. On rejection returns the time until the window resets.
    pub async fn check(&self, client: &str) -> Result<(), Duration> {
        let mut limits = self.limits.write().await;
        let now = Instant::now();

        let state = limits.entry(client.to_string()).or_insert((0, now));

        if now.duration_since(state.1) >= self.window {
            state.0 = 1;
            state.1 = now;
            debug!(client = %client, "Rate limit window reset");
            return Ok(());
        }

        state.0 += 1;
        if state.0 > self.max_requests {
            warn!(client = %client, limit = self.max_requests, "Rate limit exceeded");
            Err(self.window.saturating_sub(now.duration_since(state.1)))
        } else {
            debug!(client = %client, count = state.0, limit = self.max_requests, "Rate limit OK");
            Ok(())
        }
    }

    /// Drop windows that have already expired.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.limits
            .write()
            .await
            .retain(|_, state| now.duration_since(state.1) < window);
    }
}

/// Peer address when available, else the first `X-Forwarded-For` hop.
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Middleware rejecting clients over their request budget with 429.
pub async fn enforce(State(state): State<GatewayState>, request: Request, next: Next) -> Response {
    let key = client_key(&request);
    match state.rate_limiter.check(&key).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => ApiError::RateLimited { retry_after }.into_response(),
    }
}
