//! # Promotion Commands
//!
//! Coupon, gift card and loyalty redemption against the current order.
//!
//! Each apply checks the operator's permission, refreshes stale reference
//! data so an expired coupon is not honoured from an old list, then hands
//! the decision to the order. A rejection leaves the order unchanged.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use meridian_core::{authorize, CoreError, Permission};

use crate::commands::cart::CartView;
use crate::commands::ensure_fresh;
use crate::error::ApiError;
use crate::state::{ConfigState, SessionState};

fn rejected(kind: &str, err: CoreError) -> ApiError {
    warn!(kind, error = %err, "Promotion rejected");
    err.into()
}

pub async fn apply_coupon(
    session: &SessionState,
    config: &ConfigState,
    code: &str,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(code, "apply_coupon command");
    authorize(config.role, Permission::ApplyCoupon)?;
    ensure_fresh(session, now).await;

    let reference = session.reference().await;
    let mut order = session.order().await;
    let summary = order
        .apply_coupon(code, &reference.coupons, now)
        .map_err(|e| rejected("coupon", e))?;
    info!(code, discount = %summary.coupon_discount, "Coupon applied");
    Ok(CartView::from(&*order))
}

pub async fn remove_coupon(
    session: &SessionState,
    config: &ConfigState,
) -> Result<CartView, ApiError> {
    authorize(config.role, Permission::ApplyCoupon)?;
    let mut order = session.order().await;
    order.remove_coupon();
    Ok(CartView::from(&*order))
}

pub async fn apply_gift_card(
    session: &SessionState,
    config: &ConfigState,
    number: &str,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(number, "apply_gift_card command");
    authorize(config.role, Permission::RedeemGiftCard)?;
    ensure_fresh(session, now).await;

    let reference = session.reference().await;
    let mut order = session.order().await;
    let summary = order
        .apply_gift_card(number, &reference.gift_cards, now)
        .map_err(|e| rejected("gift_card", e))?;
    info!(number, redeemed = %summary.gift_card_discount, "Gift card applied");
    Ok(CartView::from(&*order))
}

pub async fn remove_gift_card(
    session: &SessionState,
    config: &ConfigState,
) -> Result<CartView, ApiError> {
    authorize(config.role, Permission::RedeemGiftCard)?;
    let mut order = session.order().await;
    order.remove_gift_card();
    Ok(CartView::from(&*order))
}

pub async fn apply_loyalty(
    session: &SessionState,
    config: &ConfigState,
    points: i64,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(points, "apply_loyalty command");
    authorize(config.role, Permission::RedeemLoyalty)?;
    ensure_fresh(session, now).await;

    let reference = session.reference().await;
    let mut order = session.order().await;
    let summary = order
        .apply_loyalty(points, &reference.loyalty)
        .map_err(|e| rejected("loyalty", e))?;
    info!(points, discount = %summary.loyalty_discount, "Loyalty points redeemed");
    Ok(CartView::from(&*order))
}

pub async fn remove_loyalty(
    session: &SessionState,
    config: &ConfigState,
) -> Result<CartView, ApiError> {
    authorize(config.role, Permission::RedeemLoyalty)?;
    let mut order = session.order().await;
    order.remove_loyalty();
    Ok(CartView::from(&*order))
}
