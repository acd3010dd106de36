//! # HTTP Backend
//!
//! [`SalesBackend`] over the REST API with `reqwest`.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  endpoint(["stores", id, "products"])   base_url + encoded segments     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GET/POST + bearer token + timeout                                      │
//! │       │                                                                 │
//! │       ├── transport failure  → ClientError::Network / Timeout           │
//! │       ├── non-2xx            → ClientError::Api { status, message }     │
//! │       ├── success: false     → ClientError::Api { status, message }     │
//! │       └── success: true      → data                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use meridian_core::{
    Category, Coupon, CreateSaleRequest, Customer, GiftCard, LoyaltyProgram, Product, SaleRecord,
    Store,
};

use crate::backend::{ApiEnvelope, SalesBackend};
use crate::config::BackendConfig;
use crate::error::{ClientError, ClientResult};

/// Error bodies may not carry the full envelope; only the message matters.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(HttpBackend {
            client,
            base_url: Url::parse(&config.base_url)?,
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::read_envelope(response).await
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let response = self
            .authorize(self.client.post(url).json(body))
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                });
            warn!(status = status.as_u16(), %message, "Backend returned an error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        envelope.into_result(status.as_u16())
    }
}

#[async_trait]
impl SalesBackend for HttpBackend {
    async fn list_stores(&self) -> ClientResult<Vec<Store>> {
        self.get(&["stores"]).await
    }

    async fn list_products(&self, store_id: &str) -> ClientResult<Vec<Product>> {
        self.get(&["stores", store_id, "products"]).await
    }

    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        self.get(&["categories"]).await
    }

    async fn list_customers(&self) -> ClientResult<Vec<Customer>> {
        self.get(&["customers"]).await
    }

    async fn active_coupons(&self, store_id: &str) -> ClientResult<Vec<Coupon>> {
        self.get(&["stores", store_id, "coupons", "active"]).await
    }

    async fn list_gift_cards(&self) -> ClientResult<Vec<GiftCard>> {
        self.get(&["gift-cards"]).await
    }

    async fn loyalty_settings(&self) -> ClientResult<LoyaltyProgram> {
        self.get(&["loyalty", "settings"]).await
    }

    async fn create_sale(&self, request: &CreateSaleRequest) -> ClientResult<SaleRecord> {
        self.post(&["sales"], request).await
    }
}
