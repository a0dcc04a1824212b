use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::error;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::premium::{Product, ProductSearch},
};

/// Walmart affiliate catalog search.
#[derive(Clone)]
pub struct WalmartClient {
    client: Client,
    api_key: SecretString,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<WalmartItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalmartItem {
    item_id: u64,
    name: String,
    sale_price: Option<f64>,
    msrp: Option<f64>,
    medium_image: Option<String>,
}

impl From<WalmartItem> for Product {
    fn from(item: WalmartItem) -> Self {
        Product {
            id: item.item_id.to_string(),
            name: item.name,
            price: item.sale_price.or(item.msrp).unwrap_or_default(),
            image_url: item.medium_image,
        }
    }
}

impl WalmartClient {
    pub fn new(client: Client, api_key: SecretString, api_base: String) -> Self {
        Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProductSearch for WalmartClient {
    async fn search(&self, query: &str, limit: u8) -> AppResult<Vec<Product>> {
        let response = self
            .client
            .get(format!("{}/search", self.api_base))
            .header("WM_SEC.ACCESS_TOKEN", self.api_key.expose_secret())
            .query(&[("query", query), ("numItems", &limit.to_string())])
            .send()
            .await
            .map_err(|e| AppError::upstream("Walmart request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, query, "Walmart API error");
            return Err(AppError::upstream("Walmart API error", status));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream("Failed to parse Walmart response", e))?;

        Ok(parsed.items.into_iter().map(Product::from).collect())
    }
}
