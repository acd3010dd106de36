//! # Checkout Commands
//!
//! Tenders and order placement.
//!
//! ## Placement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  pay card 120.00        → PaymentDetail recorded on the order           │
//! │  place cash 100         → PlaceOrder { cash: 100.00, Completed }        │
//! │  hold                   → PlaceOrder { Draft } (parked on the backend)  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CheckoutSubmitter::place_order                                         │
//! │         │                                                               │
//! │         ├── Ok  → SaleReceipt, order cleared (store/customer kept)      │
//! │         └── Err → backend message shown, order untouched                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use meridian_client::SaleReceipt;
use meridian_core::{
    authorize, CashTender, Money, PaymentDetail, PaymentMethod, Permission, PlaceOrder,
    SaleStatus,
};

use crate::commands::cart::CartView;
use crate::commands::ensure_fresh;
use crate::error::ApiError;
use crate::state::{ConfigState, SessionState};

/// Records a tender. Cash given at placement goes through `place_order`.
pub async fn add_payment(
    session: &SessionState,
    config: &ConfigState,
    method: PaymentMethod,
    amount: Money,
    reference: Option<String>,
) -> Result<CartView, ApiError> {
    debug!(?method, %amount, "add_payment command");
    authorize(config.role, Permission::Sell)?;

    let mut payment = PaymentDetail::new(method, amount);
    if let Some(reference) = reference {
        payment = payment.with_reference(reference);
    }

    let mut order = session.order().await;
    let summary = order.add_payment(payment)?;
    info!(paid = %summary.amount_paid, due = %summary.balance_due, "Payment recorded");
    Ok(CartView::from(&*order))
}

pub async fn clear_payments(
    session: &SessionState,
    config: &ConfigState,
) -> Result<CartView, ApiError> {
    authorize(config.role, Permission::Sell)?;
    let mut order = session.order().await;
    order.clear_payments();
    Ok(CartView::from(&*order))
}

/// Places the order as a completed sale.
pub async fn place_order(
    session: &SessionState,
    config: &ConfigState,
    cash: Option<Money>,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<SaleReceipt, ApiError> {
    debug!(cash = ?cash, "place_order command");
    authorize(config.role, Permission::Sell)?;

    let place = PlaceOrder {
        cash: cash.map(|received| CashTender { received }),
        status: SaleStatus::Completed,
        note,
    };
    submit(session, &place, now).await
}

/// Parks the order on the backend as a draft sale.
pub async fn hold_order(
    session: &SessionState,
    config: &ConfigState,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<SaleReceipt, ApiError> {
    debug!("hold_order command");
    authorize(config.role, Permission::HoldOrder)?;

    let place = PlaceOrder {
        cash: None,
        status: SaleStatus::Draft,
        note,
    };
    submit(session, &place, now).await
}

async fn submit(
    session: &SessionState,
    place: &PlaceOrder,
    now: DateTime<Utc>,
) -> Result<SaleReceipt, ApiError> {
    ensure_fresh(session, now).await;

    // Only the loyalty settings are needed; the read lock is not held
    // across the backend call.
    let loyalty = session.reference().await.loyalty.clone();

    let mut order = session.order().await;
    let receipt = session
        .submitter()
        .place_order(&mut *order, place, Some(&loyalty), now)
        .await?;
    Ok(receipt)
}
