use std::time::Duration;

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use labelguard_core::AnalysisError;

/// Everything a route can fail with, rendered as `{ error, category, retryable }`.
#[derive(Debug)]
pub enum ApiError {
    Analysis(AnalysisError),
    BadRequest(String),
    PayloadTooLarge(String),
    NotFound(String),
    CatalogUnavailable(String),
    RateLimited { retry_after: Duration },
    Internal(String),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::Analysis(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, String, String, bool) {
        match self {
            ApiError::Analysis(err) => {
                let category = err.category();
                (
                    StatusCode::from_u16(category.http_status())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    err.user_message(),
                    category.to_string(),
                    category.retryable(),
                )
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "invalid_input".into(), false)
            }
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                msg.clone(),
                "payload_too_large".into(),
                false,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), "not_found".into(), false),
            ApiError::CatalogUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                msg.clone(),
                "catalog_unavailable".into(),
                true,
            ),
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many analysis requests. Please wait a moment and try again.".into(),
                "rate_limited".into(),
                true,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg.clone(),
                "internal".into(),
                true,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, category, retryable) = self.parts();
        let body = Json(json!({
            "error": message,
            "category": category,
            "retryable": retryable,
        }));

        let mut response = (status, body).into_response();
        if let ApiError::RateLimited { retry_after } = self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}
