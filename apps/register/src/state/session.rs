//! # Session State
//!
//! One register session: the order being built, the reference data it is
//! built from, and the submitter that places it.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order      tokio Mutex<Order>          held across the create-sale     │
//! │                                         await so nothing edits an       │
//! │                                         order that is being placed      │
//! │                                                                         │
//! │  reference  tokio RwLock<ReferenceData> many readers, one refresher     │
//! │                                                                         │
//! │  submitter  CheckoutSubmitter           its own in-flight flag          │
//! │                                                                         │
//! │  Lock order: reference before order, never the other way round.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use meridian_client::{CheckoutSubmitter, ClientResult, ReferenceData, SalesBackend};
use meridian_core::{Order, PricingConfig, PromotionError};

use crate::error::ApiError;

pub struct SessionState {
    order: Mutex<Order>,
    reference: RwLock<ReferenceData>,
    backend: Arc<dyn SalesBackend>,
    submitter: CheckoutSubmitter,
    reference_ttl: Duration,
}

impl SessionState {
    /// Loads reference data for `store_id` and opens an empty order with
    /// that store selected.
    pub async fn start(
        backend: Arc<dyn SalesBackend>,
        store_id: &str,
        reference_ttl: Duration,
        pricing: PricingConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let reference = ReferenceData::load(backend.as_ref(), store_id, reference_ttl, now).await?;

        let mut order = Order::new(pricing);
        let store = reference
            .current_store()
            .cloned()
            .ok_or_else(|| ApiError::not_found("Store", store_id))?;
        info!(store_id, store = %store.name, "Register session started");
        order.select_store(store);

        Ok(SessionState {
            order: Mutex::new(order),
            reference: RwLock::new(reference),
            submitter: CheckoutSubmitter::new(backend.clone()),
            backend,
            reference_ttl,
        })
    }

    pub async fn order(&self) -> MutexGuard<'_, Order> {
        self.order.lock().await
    }

    pub async fn reference(&self) -> RwLockReadGuard<'_, ReferenceData> {
        self.reference.read().await
    }

    pub fn submitter(&self) -> &CheckoutSubmitter {
        &self.submitter
    }

    /// Reloads reference data for `store_id` (or the current store) and
    /// re-checks the order against it.
    ///
    /// Returns the promotions dropped because the fresh data no longer
    /// supports them: a coupon the store stopped offering, or a loyalty
    /// redemption above the customer's current balance.
    pub async fn refresh(
        &self,
        store_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> ClientResult<Vec<PromotionError>> {
        let store_id = match store_id {
            Some(id) => id.to_string(),
            None => self.reference.read().await.store_id.clone(),
        };
        let fresh =
            ReferenceData::load(self.backend.as_ref(), &store_id, self.reference_ttl, now).await?;

        let mut reference = self.reference.write().await;
        *reference = fresh;
        let reference = reference.downgrade();
        let mut order = self.order.lock().await;

        let mut dropped = Vec::new();
        let customer = order
            .customer()
            .and_then(|c| reference.customer(&c.id))
            .cloned();
        if let Some(customer) = customer {
            dropped.extend(order.refresh_customer(customer));
        }
        dropped.extend(order.revalidate_coupon(&reference.coupons, now));

        for err in &dropped {
            warn!(store_id = %store_id, error = %err, "Promotion dropped after reload");
        }
        Ok(dropped)
    }

    /// Reloads reference data when its TTL has run out. Returns whether a
    /// reload happened.
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> ClientResult<bool> {
        if !self.reference.read().await.is_stale(now) {
            return Ok(false);
        }
        debug!("Reference data is stale, reloading");
        self.refresh(None, now).await?;
        Ok(true)
    }
}
