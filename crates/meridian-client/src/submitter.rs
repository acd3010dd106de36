//! # Checkout Submitter
//!
//! Places an order with the sales backend exactly once per attempt.
//!
//! ## Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  place_order(&mut order, place)                                         │
//! │       │                                                                 │
//! │       ├── already placing?  → ClientError::SubmissionInFlight           │
//! │       ├── build_sale_request → MissingStore / EmptyOrder                │
//! │       │                                                                 │
//! │       ├── backend.create_sale(request)   (one call, no retry)           │
//! │       │        │                                                        │
//! │       │        ├── Ok  → order.clear(), SaleReceipt                     │
//! │       │        └── Err → order untouched, backend message returned      │
//! │       │                                                                 │
//! │       └── in-flight flag released (guard drop)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use meridian_core::{
    build_sale_request, CreateSaleRequest, LoyaltyProgram, Order, PlaceOrder, SaleRecord,
};

use crate::backend::SalesBackend;
use crate::error::{ClientError, ClientResult};

/// A placed sale with everything needed to print its receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: SaleRecord,
    pub request: CreateSaleRequest,
    pub store_name: String,
    pub customer_name: Option<String>,
    pub placed_at: DateTime<Utc>,
}

pub struct CheckoutSubmitter {
    backend: Arc<dyn SalesBackend>,
    placing: AtomicBool,
}

/// Clears the placing flag when dropped, on every exit path.
struct PlacingGuard<'a>(&'a AtomicBool);

impl Drop for PlacingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutSubmitter {
    pub fn new(backend: Arc<dyn SalesBackend>) -> Self {
        CheckoutSubmitter {
            backend,
            placing: AtomicBool::new(false),
        }
    }

    pub fn is_placing(&self) -> bool {
        self.placing.load(Ordering::Acquire)
    }

    fn begin(&self) -> ClientResult<PlacingGuard<'_>> {
        self.placing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::SubmissionInFlight)?;
        Ok(PlacingGuard(&self.placing))
    }

    /// Places `order`. On success the order is cleared; on failure it is
    /// left exactly as it was.
    pub async fn place_order(
        &self,
        order: &mut Order,
        place: &PlaceOrder,
        loyalty: Option<&LoyaltyProgram>,
        now: DateTime<Utc>,
    ) -> ClientResult<SaleReceipt> {
        let _guard = self.begin()?;

        let request = build_sale_request(order, place, loyalty)?;
        let store_name = order.store().map(|s| s.name.clone()).unwrap_or_default();
        let customer_name = order.customer().map(|c| c.name.clone());

        let sale = match self.backend.create_sale(&request).await {
            Ok(sale) => sale,
            Err(err) => {
                error!(
                    client_reference = %request.client_reference,
                    error = %err,
                    "Failed to place order"
                );
                return Err(err);
            }
        };

        info!(
            invoice = %sale.invoice_number,
            total = %request.billing_summary.grand_total,
            lines = request.products.len(),
            "Order placed"
        );
        order.clear();

        Ok(SaleReceipt {
            sale,
            request,
            store_name,
            customer_name,
            placed_at: now,
        })
    }
}
