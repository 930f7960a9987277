//! Product image upload and analysis (`POST /api/analyze`).

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use labelguard_core::{AnalysisRequest, ComplianceResult};
use labelguard_history::HistoryRecord;
use labelguard_logging::{AnalysisEvent, EventLogger};

use crate::error::ApiError;
use crate::server::GatewayState;

const FALLBACK_PRODUCT_NAME: &str = "Product";

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    /// Append the result to the history log.
    #[serde(default = "default_record")]
    pub record: bool,
}

fn default_record() -> bool {
    true
}

/// Handler for `POST /api/analyze`.
///
/// Multipart fields: `file` (required), `productName`, `productDescription`.
pub async fn analyze_upload(
    State(state): State<GatewayState>,
    Query(params): Query<AnalyzeParams>,
    mut multipart: Multipart,
) -> Result<Json<ComplianceResult>, ApiError> {
    let mut request = AnalysisRequest::default();
    let mut file_name = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                request.mime_type = field.content_type().map(str::to_string).unwrap_or_default();
                request.image = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read upload", e))?
                    .to_vec();
            }
            Some("productName") => request.product_name = Some(read_text(field).await?),
            Some("productDescription") => request.product_description = Some(read_text(field).await?),
            _ => {}
        }
    }

    info!(
        bytes = request.image.len(),
        mime = %request.mime_type,
        file = ?file_name,
        "Received analysis upload"
    );

    let label = request
        .product_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or(file_name)
        .unwrap_or_else(|| FALLBACK_PRODUCT_NAME.to_string());

    run_and_record(&state, &request, &label, params.record).await.map(Json)
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| multipart_error("Invalid form field", e))
}

/// Keeps the body limit distinguishable from a malformed form.
fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %err, "Upload exceeds the configured size limit");
        ApiError::PayloadTooLarge("Uploaded file is too large".into())
    } else {
        ApiError::BadRequest(format!("{}: {}", context, err))
    }
}

/// Run the pipeline, emit the audit event, and append the result to history.
///
/// A failed history append is logged; the analysis result is still returned.
pub(crate) async fn run_and_record(
    state: &GatewayState,
    request: &AnalysisRequest,
    product_name: &str,
    record: bool,
) -> Result<ComplianceResult, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let cancel = state.shutdown.child_token();

    let result = match state.pipeline.analyze(request, &cancel).await {
        Ok(result) => result,
        Err(err) => {
            EventLogger::log_event(
                &request_id,
                AnalysisEvent::Failed {
                    category: err.category().to_string(),
                    error_msg: err.to_string(),
                },
            );
            return Err(err.into());
        }
    };

    EventLogger::log_event(
        &request_id,
        AnalysisEvent::Completed {
            product_name: product_name.to_string(),
            compliance_score: result.compliance_score,
            checks: result.compliances.len(),
        },
    );

    if record {
        let entry = HistoryRecord::from_result(product_name, &result);
        if let Err(e) = state.history.append(&entry) {
            warn!(request_id = %request_id, error = %e, "Failed to record analysis history");
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use labelguard_analysis::{AnalysisPipeline, PipelineOptions};
    use labelguard_history::HistoryStore;
    use labelguard_providers::MockVisionModel;

    use crate::server::{build_router, GatewayState};
    use crate::RateLimiter;

    const BOUNDARY: &str = "labelguard-test-boundary";
    const REPLY: &str = "```json\n{\"extractedText\":\"Milk 500ml\",\"compliances\":[{\"rule\":\"Product name is clearly visible\",\"passed\":true,\"details\":\"ok\"}]}\n```";

    fn state_with(model: Option<Arc<MockVisionModel>>) -> GatewayState {
        let model = model.map(|m| m as Arc<dyn labelguard_core::VisionModel>);
        GatewayState::new(
            AnalysisPipeline::new(model, PipelineOptions::default()),
            HistoryStore::in_memory().unwrap(),
        )
    }

    fn multipart(fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, data) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_is_analyzed_and_recorded() {
        let model = Arc::new(MockVisionModel::with_reply(REPLY));
        let state = state_with(Some(model.clone()));
        let history = state.history.clone();
        let app = build_router(state, 1024 * 1024);

        let body = multipart(&[
            ("file", Some("milk.jpg"), &[0xFF, 0xD8, 0xFF]),
            ("productName", None, b"Whole Milk"),
        ]);
        let response = app.oneshot(upload("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["extractedText"], "Milk 500ml");
        assert_eq!(json["complianceScore"], 10);

        assert_eq!(model.calls(), 1);
        assert!(model.last_instruction().unwrap().contains("- Product Name: Whole Milk"));

        let records = history.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_name, "Whole Milk");
        assert_eq!(records[0].compliance_score, 10);
    }

    #[tokio::test]
    async fn test_missing_file_is_bad_request() {
        let model = Arc::new(MockVisionModel::with_reply(REPLY));
        let app = build_router(state_with(Some(model.clone())), 1024 * 1024);

        let body = multipart(&[("productName", None, b"Milk")]);
        let response = app.oneshot(upload("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["category"], "invalid_input");
        assert_eq!(json["error"], "No file provided");
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let model = Arc::new(MockVisionModel::with_reply(REPLY));
        let app = build_router(state_with(Some(model.clone())), 16);

        let image = vec![0xAB; 4096];
        let body = multipart(&[("file", Some("big.jpg"), image.as_slice())]);
        let response = app.oneshot(upload("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = json_body(response).await;
        assert_eq!(json["category"], "payload_too_large");
        assert_eq!(json["retryable"], false);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_model() {
        let app = build_router(state_with(None), 1024 * 1024);
        let body = multipart(&[("file", Some("a.jpg"), b"img")]);
        let response = app.oneshot(upload("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["category"], "not_configured");
    }

    #[tokio::test]
    async fn test_upstream_rate_limit_maps_to_429() {
        let model = Arc::new(MockVisionModel::with_error("Gemini returned 429 Too Many Requests"));
        let app = build_router(state_with(Some(model)), 1024 * 1024);
        let body = multipart(&[("file", Some("a.jpg"), b"img")]);
        let response = app.oneshot(upload("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = json_body(response).await;
        assert_eq!(json["category"], "rate_limited");
        assert_eq!(json["retryable"], true);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_not_recorded() {
        let model = Arc::new(MockVisionModel::with_reply("No JSON here, sorry."));
        let state = state_with(Some(model));
        let history = state.history.clone();
        let app = build_router(state, 1024 * 1024);

        let body = multipart(&[("file", Some("a.jpg"), b"img")]);
        let response = app.oneshot(upload("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["category"], "parse_error");
        assert_eq!(history.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_flag_and_file_name_label() {
        let model = Arc::new(MockVisionModel::with_reply(REPLY));
        let state = state_with(Some(model));
        let history = state.history.clone();
        let app = build_router(state, 1024 * 1024);

        let body = multipart(&[("file", Some("cereal.png"), b"img")]);
        let response = app.clone().oneshot(upload("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(history.list().unwrap()[0].product_name, "cereal.png");

        let body = multipart(&[("file", Some("cereal.png"), b"img")]);
        let response = app.oneshot(upload("/api/analyze?record=false", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(history.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_gateway_rate_limit() {
        let model = Arc::new(MockVisionModel::with_reply(REPLY));
        let state = state_with(Some(model)).with_rate_limiter(RateLimiter::new(1, 60));
        let app = build_router(state, 1024 * 1024);

        let first = app
            .clone()
            .oneshot(upload("/api/analyze", multipart(&[("file", Some("a.jpg"), b"img")])))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(upload("/api/analyze", multipart(&[("file", Some("a.jpg"), b"img")])))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_history_and_analytics_routes() {
        let model = Arc::new(MockVisionModel::with_reply(REPLY));
        let app = build_router(state_with(Some(model)), 1024 * 1024);

        for _ in 0..2 {
            let body = multipart(&[("file", Some("a.jpg"), b"img")]);
            app.clone().oneshot(upload("/api/analyze", body)).await.unwrap();
        }

        let response = app
            .clone()
            .oneshot(Request::get("/api/history?limit=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
        assert_eq!(json["history"][0]["status"], "failed");

        let response = app
            .oneshot(Request::get("/api/analytics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["totalProducts"], 2);
        assert_eq!(json["averageScore"], 10);
        assert_eq!(json["atRisk"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let app = build_router(state_with(None), 1024);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["configured"], false);
        assert_eq!(json["historyRecords"], 0);
    }
}
