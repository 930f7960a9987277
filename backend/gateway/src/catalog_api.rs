//! Catalog routes: list products and analyze a catalog product by id.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use labelguard_catalog::CatalogClient;
use labelguard_core::{AnalysisRequest, ComplianceResult};

use crate::analyze::run_and_record;
use crate::error::ApiError;
use crate::server::GatewayState;

fn catalog(state: &GatewayState) -> Result<&Arc<CatalogClient>, ApiError> {
    state
        .catalog
        .as_ref()
        .ok_or_else(|| ApiError::CatalogUnavailable("Product catalog not configured".into()))
}

/// Handler for `GET /api/products`
pub async fn list_products(State(state): State<GatewayState>) -> Result<Json<Value>, ApiError> {
    let products = catalog(&state)?.list_products().await.map_err(|e| {
        error!(error = %e, "Failed to list catalog products");
        ApiError::CatalogUnavailable("Failed to fetch products".into())
    })?;
    Ok(Json(json!({ "products": products })))
}

/// Handler for `POST /api/products/:id/analyze`
pub async fn analyze_product(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<ComplianceResult>, ApiError> {
    let client = catalog(&state)?;

    let product = client
        .find_product(&id)
        .await
        .map_err(|e| {
            error!(product_id = %id, error = %e, "Catalog lookup failed");
            ApiError::CatalogUnavailable("Failed to fetch products".into())
        })?
        .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", id)))?;

    let image_url = product
        .image_url
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest(format!("Product {} has no image", id)))?;

    let (image, mime_type) = client.fetch_image(image_url).await.map_err(|e| {
        error!(product_id = %id, error = %e, "Product image download failed");
        ApiError::CatalogUnavailable("Failed to download product image".into())
    })?;

    info!(product_id = %id, name = %product.name, "Analyzing catalog product");

    let request = AnalysisRequest::new(image, mime_type)
        .with_product_name(product.name.clone())
        .with_product_description(product.description.clone());

    run_and_record(&state, &request, &product.name, true)
        .await
        .map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
        routing::get,
        Router,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    use labelguard_analysis::{AnalysisPipeline, PipelineOptions};
    use labelguard_catalog::CatalogClient;
    use labelguard_core::VisionModel;
    use labelguard_history::HistoryStore;
    use labelguard_providers::MockVisionModel;

    use crate::server::{build_router, GatewayState};

    const REPLY: &str = r#"{"extractedText":"Green Tea 20 bags","compliances":[{"rule":"Product name is clearly visible","passed":true,"details":"ok"}]}"#;

    fn state() -> GatewayState {
        GatewayState::new(
            AnalysisPipeline::new(None, PipelineOptions::default()),
            HistoryStore::in_memory().unwrap(),
        )
    }

    /// Serve a two-product catalog and one PNG on an ephemeral port. Returns the listing URL.
    async fn spawn_catalog() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let listing = json!([
            {
                "name": "Green Tea",
                "description": "20 bags",
                "image": { "url": format!("{}/images/tea.png", base) }
            },
            { "_id": "bare", "name": "Bare Box" }
        ]);

        let app = Router::new()
            .route(
                "/products",
                get(move || {
                    let listing = listing.clone();
                    async move { axum::Json(listing) }
                }),
            )
            .route(
                "/images/tea.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, 0x50, 0x4E, 0x47]) }),
            );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("{}/products", base)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str) -> Request<Body> {
        Request::post(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_listed_product_is_analyzed_by_id() {
        let model = Arc::new(MockVisionModel::with_reply(REPLY));
        let catalog_url = spawn_catalog().await;
        let state = GatewayState::new(
            AnalysisPipeline::new(
                Some(model.clone() as Arc<dyn VisionModel>),
                PipelineOptions::default(),
            ),
            HistoryStore::in_memory().unwrap(),
        )
        .with_catalog(CatalogClient::new(catalog_url));
        let history = state.history.clone();
        let app = build_router(state, 1024 * 1024);

        let response = app
            .clone()
            .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listing = json_body(response).await;
        let products = listing["products"].as_array().unwrap();
        assert_eq!(products.len(), 2);
        let id = products[0]["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post(&format!("/api/products/{}/analyze", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["extractedText"], "Green Tea 20 bags");
        assert_eq!(json["complianceScore"], 10);

        let instruction = model.last_instruction().unwrap();
        assert!(instruction.contains("- Product Name: Green Tea"));
        assert!(instruction.contains("- Description: 20 bags"));

        let records = history.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_name, "Green Tea");
    }

    #[tokio::test]
    async fn test_unknown_or_imageless_product() {
        let catalog_url = spawn_catalog().await;
        let app = build_router(state().with_catalog(CatalogClient::new(catalog_url)), 1024);

        let response = app.clone().oneshot(post("/api/products/missing/analyze")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(post("/api/products/bare/analyze")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_products_without_catalog() {
        let app = build_router(state(), 1024);
        let response = app
            .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Product catalog not configured");
        assert_eq!(json["category"], "catalog_unavailable");
    }

    #[tokio::test]
    async fn test_analyze_product_without_catalog() {
        let app = build_router(state(), 1024);
        let response = app.oneshot(post("/api/products/abc/analyze")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
