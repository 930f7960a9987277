//! Gateway Health API

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub provider: Option<String>,
    /// False when no vision model credential is configured.
    pub configured: bool,
    pub catalog: bool,
    pub history_records: Option<usize>,
    pub uptime_seconds: u64,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "labelguard",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.pipeline.provider_name().map(str::to_string),
        configured: state.pipeline.is_configured(),
        catalog: state.catalog.is_some(),
        history_records: state.history.count().ok(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
