//! # Sales Backend
//!
//! The seam between the register and the remote sales service. The HTTP
//! implementation lives in [`crate::http`]; tests substitute their own.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method  Path                              Returns                      │
//! │  ──────  ────                              ───────                      │
//! │  GET     /stores                           Vec<Store>                   │
//! │  GET     /stores/{store}/products          Vec<Product>                 │
//! │  GET     /categories                       Vec<Category>                │
//! │  GET     /customers                        Vec<Customer>                │
//! │  GET     /stores/{store}/coupons/active    Vec<Coupon>                  │
//! │  GET     /gift-cards                       Vec<GiftCard>                │
//! │  GET     /loyalty/settings                 LoyaltyProgram               │
//! │  POST    /sales                            SaleRecord                   │
//! │                                                                         │
//! │  Every response: { "success": bool, "message"?: str, "data"?: T }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use meridian_core::{
    Category, Coupon, CreateSaleRequest, Customer, GiftCard, LoyaltyProgram, Product, SaleRecord,
    Store,
};

use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait SalesBackend: Send + Sync {
    async fn list_stores(&self) -> ClientResult<Vec<Store>>;

    async fn list_products(&self, store_id: &str) -> ClientResult<Vec<Product>>;

    async fn list_categories(&self) -> ClientResult<Vec<Category>>;

    async fn list_customers(&self) -> ClientResult<Vec<Customer>>;

    async fn active_coupons(&self, store_id: &str) -> ClientResult<Vec<Coupon>>;

    async fn list_gift_cards(&self) -> ClientResult<Vec<GiftCard>>;

    async fn loyalty_settings(&self) -> ClientResult<LoyaltyProgram>;

    /// Creates the sale. Called once per placement attempt; never retried.
    async fn create_sale(&self, request: &CreateSaleRequest) -> ClientResult<SaleRecord>;
}

/// Response envelope used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        ApiEnvelope {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ApiEnvelope {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Unwraps the payload, turning `success: false` into [`ClientError::Api`].
    pub fn into_result(self, status: u16) -> ClientResult<T> {
        if !self.success {
            return Err(ClientError::Api {
                status,
                message: self
                    .message
                    .unwrap_or_else(|| "The backend rejected the request".to_string()),
            });
        }
        self.data
            .ok_or_else(|| ClientError::Decode("response is missing data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let envelope: ApiEnvelope<SaleRecord> = serde_json::from_str(
            r#"{"success":true,"data":{"id":"s1","invoiceNumber":"INV-0001"}}"#,
        )
        .unwrap();
        let sale = envelope.into_result(201).unwrap();
        assert_eq!(sale.invoice_number, "INV-0001");
    }

    #[test]
    fn test_envelope_failure_keeps_message() {
        let envelope: ApiEnvelope<SaleRecord> =
            serde_json::from_str(r#"{"success":false,"message":"Store is closed"}"#).unwrap();
        match envelope.into_result(200) {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "Store is closed");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_envelope_missing_data() {
        let envelope: ApiEnvelope<Vec<Store>> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(envelope.into_result(200), Err(ClientError::Decode(_))));
    }
}
