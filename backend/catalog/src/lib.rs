//! Product catalog client.
//!
//! Lists candidate products from a remote catalog and downloads their images so
//! callers can feed them to the analysis pipeline.

use anyhow::{bail, Context, Result};
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// How many catalog entries are surfaced per listing.
pub const MAX_PRODUCTS: usize = 12;

const FALLBACK_MIME: &str = "image/jpeg";

/// A product offered by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub description: String,
}

pub struct CatalogClient {
    client: Client,
    url: String,
}

impl CatalogClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Fetch the catalog and map up to [`MAX_PRODUCTS`] entries.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Catalog HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Catalog returned {}", status);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse catalog response")?;

        let products = map_products(&body);
        info!(count = products.len(), "Fetched catalog products");
        Ok(products)
    }

    /// Look up one product by id.
    pub async fn find_product(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.list_products().await?.into_iter().find(|p| p.id == id))
    }

    /// Download a product image. Returns the bytes and their MIME type.
    pub async fn fetch_image(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Product image request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Product image request returned {}", status);
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let bytes = response
            .bytes()
            .await
            .context("Failed to read product image body")?;

        debug!(url = %url, bytes = bytes.len(), mime = %mime_type, "Downloaded product image");
        Ok((bytes.to_vec(), mime_type))
    }
}

/// Accepts either a bare array or `{ "products": [...] }`.
pub fn map_products(body: &Value) -> Vec<Product> {
    let items = match body {
        Value::Array(items) => items.as_slice(),
        other => other
            .get("products")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    };

    items.iter().take(MAX_PRODUCTS).map(map_product).collect()
}

fn map_product(item: &Value) -> Product {
    let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

    let name = text(item.get("name"))
        .or_else(|| text(item.get("title")))
        .unwrap_or_else(|| "Untitled Product".to_string());

    let image_url = text(item.pointer("/image/url"))
        .or_else(|| text(item.pointer("/productImage/url")))
        .or_else(|| text(item.pointer("/brand/logo/url")));

    let description = text(item.get("description")).unwrap_or_default();

    let id = text(item.get("_id"))
        .or_else(|| text(item.get("id")))
        .unwrap_or_else(|| fallback_id(&name, image_url.as_deref(), &description));

    Product {
        id,
        name,
        image_url,
        description,
    }
}

/// Id for entries without `_id` or `id`. Derived from the content so a
/// later listing resolves the same product.
fn fallback_id(name: &str, image_url: Option<&str>, description: &str) -> String {
    let key = format!("{}\n{}\n{}", name, image_url.unwrap_or_default(), description);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}
