//! History and analytics routes over the append-only history log.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use labelguard_history::AnalyticsSummary;

use crate::error::ApiError;
use crate::server::GatewayState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

/// Handler for `GET /api/history`: newest records first.
pub async fn get_history(
    State(state): State<GatewayState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let records = state.history.recent(limit).map_err(|e| {
        error!(error = %e, "Failed to read history");
        ApiError::Internal("Failed to read history".into())
    })?;
    Ok(Json(json!({ "history": records })))
}

/// Handler for `GET /api/analytics`.
pub async fn get_analytics(
    State(state): State<GatewayState>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let records = state.history.list().map_err(|e| {
        error!(error = %e, "Failed to read history for analytics");
        ApiError::Internal("Failed to read history".into())
    })?;
    Ok(Json(AnalyticsSummary::from_records(&records)))
}
