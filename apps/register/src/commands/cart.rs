//! # Cart Commands
//!
//! Line items, line discounts, store and customer selection.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│  Tender  │────►│  Placed  │       │
//! │  │  Order   │     │          │     │          │     │          │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                   add_to_cart       place_order                        │
//! │                   update_cart_item  (checkout.rs)                      │
//! │                   remove_from_cart                                      │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The operator refers to lines by their 1-based position in the cart view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use meridian_client::ReferenceData;
use meridian_core::{
    authorize, AppliedPromotion, BillingSummary, DiscountRule, Money, Order, PaymentDetail,
    Permission, Product, ProductVariant, PromotionError,
};

use crate::error::ApiError;
use crate::state::{ConfigState, SessionState};

/// One cart line as shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// 1-based position used by `qty`, `remove` and `discount`
    pub index: usize,
    pub line_id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// Cart response including lines, promotions and totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub store: Option<String>,
    pub customer: Option<String>,
    pub lines: Vec<CartLine>,
    pub promotions: Vec<AppliedPromotion>,
    pub payments: Vec<PaymentDetail>,
    pub summary: BillingSummary,
    /// Messages about changes the register made on its own, such as a
    /// promotion dropped after a store switch.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

impl From<&Order> for CartView {
    fn from(order: &Order) -> Self {
        let lines = order
            .items()
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let amounts = order.line_amounts(line);
                CartLine {
                    index: i + 1,
                    line_id: line.line_id.clone(),
                    name: line.name.clone(),
                    sku: line.sku.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discount: amounts.discount,
                    tax: amounts.tax,
                    total: amounts.total,
                }
            })
            .collect();

        CartView {
            store: order.store().map(|s| s.name.clone()),
            customer: order.customer().map(|c| c.name.clone()),
            lines,
            promotions: order.promotions().iter().cloned().collect(),
            payments: order.payments().to_vec(),
            summary: order.summary(),
            notices: Vec::new(),
        }
    }
}

/// Finds a sellable item by product SKU, barcode or variant SKU.
pub(crate) fn resolve_item<'a>(
    reference: &'a ReferenceData,
    code: &str,
) -> Option<(&'a Product, Option<&'a ProductVariant>)> {
    if let Some(product) = reference.product_by_code(code) {
        return Some((product, None));
    }
    let code = code.trim();
    reference
        .products
        .iter()
        .filter(|p| p.is_active)
        .find_map(|p| {
            p.variants
                .iter()
                .find(|v| v.sku.eq_ignore_ascii_case(code))
                .map(|v| (p, Some(v)))
        })
}

/// Maps a 1-based cart position to its line id.
fn line_id_at(order: &Order, index: usize) -> Option<String> {
    index
        .checked_sub(1)
        .and_then(|i| order.items().get(i))
        .map(|line| line.line_id.clone())
}

pub async fn get_cart(session: &SessionState) -> CartView {
    debug!("get_cart command");
    CartView::from(&*session.order().await)
}

/// Adds a product (or variant) by code.
///
/// ## Behavior
/// - Already in cart: quantity increases
/// - Not in cart: added as a new line with the price frozen
/// - Quantity 0 or less: nothing changes
pub async fn add_to_cart(
    session: &SessionState,
    config: &ConfigState,
    code: &str,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(code, quantity, "add_to_cart command");
    authorize(config.role, Permission::Sell)?;

    let reference = session.reference().await;
    let (product, variant) =
        resolve_item(&reference, code).ok_or_else(|| ApiError::not_found("Product", code))?;

    let mut order = session.order().await;
    order.add_item(product, variant, quantity)?;
    info!(sku = %product.sku, quantity, lines = order.items().len(), "Item added");
    Ok(CartView::from(&*order))
}

/// Sets the quantity of a line; zero or less removes it.
pub async fn update_cart_item(
    session: &SessionState,
    config: &ConfigState,
    index: usize,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(index, quantity, "update_cart_item command");
    authorize(config.role, Permission::Sell)?;

    let mut order = session.order().await;
    let line_id =
        line_id_at(&order, index).ok_or_else(|| ApiError::not_found("Line", &index.to_string()))?;
    order.update_quantity(&line_id, quantity)?;
    Ok(CartView::from(&*order))
}

/// Removes a line. A position past the end changes nothing.
pub async fn remove_from_cart(
    session: &SessionState,
    config: &ConfigState,
    index: usize,
) -> Result<CartView, ApiError> {
    debug!(index, "remove_from_cart command");
    authorize(config.role, Permission::Sell)?;

    let mut order = session.order().await;
    if let Some(line_id) = line_id_at(&order, index) {
        order.remove_item(&line_id);
    }
    Ok(CartView::from(&*order))
}

pub async fn clear_cart(session: &SessionState, config: &ConfigState) -> Result<CartView, ApiError> {
    debug!("clear_cart command");
    authorize(config.role, Permission::ClearOrder)?;

    let mut order = session.order().await;
    order.clear();
    info!("Order cleared");
    Ok(CartView::from(&*order))
}

/// Overrides (or removes) the discount on one line. Manager and above.
pub async fn set_line_discount(
    session: &SessionState,
    config: &ConfigState,
    index: usize,
    discount: Option<DiscountRule>,
) -> Result<CartView, ApiError> {
    debug!(index, ?discount, "set_line_discount command");
    if let Err(e) = authorize(config.role, Permission::OverrideLineDiscount) {
        warn!(operator = %config.operator, role = %config.role, "Line discount refused");
        return Err(e.into());
    }

    let mut order = session.order().await;
    let line_id =
        line_id_at(&order, index).ok_or_else(|| ApiError::not_found("Line", &index.to_string()))?;
    order.set_line_discount(&line_id, discount)?;
    Ok(CartView::from(&*order))
}

/// Selects a customer by id or phone number; `None` deselects.
pub async fn select_customer(
    session: &SessionState,
    config: &ConfigState,
    query: Option<&str>,
) -> Result<CartView, ApiError> {
    debug!(?query, "select_customer command");
    authorize(config.role, Permission::Sell)?;

    let customer = match query {
        Some(query) => {
            let reference = session.reference().await;
            let found = reference
                .customer(query)
                .or_else(|| reference.customer_by_phone(query))
                .cloned()
                .ok_or_else(|| ApiError::not_found("Customer", query))?;
            Some(found)
        }
        None => None,
    };

    let mut order = session.order().await;
    order.select_customer(customer);
    Ok(CartView::from(&*order))
}

/// Switches the store context, reloading its catalog and promotions.
///
/// Lines already in the order keep their frozen prices.
pub async fn select_store(
    session: &SessionState,
    config: &ConfigState,
    store_id: &str,
    now: DateTime<Utc>,
) -> Result<CartView, ApiError> {
    debug!(store_id, "select_store command");
    authorize(config.role, Permission::Sell)?;

    let store = session
        .reference()
        .await
        .store(store_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Store", store_id))?;
    if !store.is_active {
        return Err(ApiError::validation(format!("Store {} is not active", store.name)));
    }

    let dropped = session.refresh(Some(store_id), now).await?;

    let mut order = session.order().await;
    info!(store_id, store = %store.name, dropped = dropped.len(), "Store selected");
    order.select_store(store);
    let mut view = CartView::from(&*order);
    view.notices = dropped.iter().map(dropped_notice).collect();
    Ok(view)
}

/// Operator-facing line for a promotion removed by a reload.
pub(crate) fn dropped_notice(err: &PromotionError) -> String {
    format!("Removed from order: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::checkout::place_order;
    use crate::commands::promotion::apply_coupon;
    use crate::error::ErrorCode;
    use crate::testing::{manager, session};

    #[tokio::test]
    async fn test_add_by_sku_barcode_and_variant() {
        let (_backend, session) = session().await;
        let config = ConfigState::default();

        add_to_cart(&session, &config, "cola-330", 1).await.unwrap();
        add_to_cart(&session, &config, "5449000000996", 1).await.unwrap();
        let view = add_to_cart(&session, &config, "SHIRT-L", 1).await.unwrap();

        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.lines[1].name, "Shirt (Large)");
        assert_eq!(view.lines[1].unit_price.cents(), 2_700);
        assert_eq!(view.summary.sub_total.cents(), 22_700);
        assert_eq!(view.store.as_deref(), Some("Main Street"));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (_backend, session) = session().await;
        let err = add_to_cart(&session, &ConfigState::default(), "NOPE", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(get_cart(&session).await.lines.is_empty());
    }

    #[tokio::test]
    async fn test_quantity_update_and_removal_by_position() {
        let (_backend, session) = session().await;
        let config = ConfigState::default();
        add_to_cart(&session, &config, "COLA-330", 1).await.unwrap();
        add_to_cart(&session, &config, "SHIRT", 1).await.unwrap();

        let view = update_cart_item(&session, &config, 1, 3).await.unwrap();
        assert_eq!(view.lines[0].quantity, 3);

        let view = update_cart_item(&session, &config, 2, 0).await.unwrap();
        assert_eq!(view.lines.len(), 1);

        let err = update_cart_item(&session, &config, 5, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let before = get_cart(&session).await;
        let after = remove_from_cart(&session, &config, 9).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_quantity_limit_is_a_cart_error() {
        let (_backend, session) = session().await;
        let err = add_to_cart(&session, &ConfigState::default(), "COLA-330", 1_000)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_cashier_cannot_override_line_discount() {
        let (_backend, session) = session().await;
        let cashier = ConfigState::default();
        add_to_cart(&session, &cashier, "COLA-330", 2).await.unwrap();

        let err = set_line_discount(
            &session,
            &cashier,
            1,
            Some(DiscountRule::Percentage { bps: 5000 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let view = set_line_discount(
            &session,
            &manager(),
            1,
            Some(DiscountRule::Percentage { bps: 5000 }),
        )
        .await
        .unwrap();
        assert_eq!(view.lines[0].discount.cents(), 10_000);
        assert_eq!(view.summary.sub_total.cents(), 10_000);
    }

    #[tokio::test]
    async fn test_clear_keeps_store_and_customer() {
        let (_backend, session) = session().await;
        let config = ConfigState::default();
        add_to_cart(&session, &config, "COLA-330", 1).await.unwrap();
        select_customer(&session, &config, Some("555 0100")).await.unwrap();

        let view = clear_cart(&session, &config).await.unwrap();
        assert!(view.lines.is_empty());
        assert!(view.summary.grand_total.is_zero());
        assert_eq!(view.customer.as_deref(), Some("Ada Lovelace"));
        assert_eq!(view.store.as_deref(), Some("Main Street"));
    }

    #[tokio::test]
    async fn test_select_store_reloads_reference_data() {
        let (backend, session) = session().await;
        let config = ConfigState::default();

        let view = select_store(&session, &config, "store-2", Utc::now()).await.unwrap();
        assert_eq!(view.store.as_deref(), Some("Harbour"));
        assert_eq!(session.reference().await.store_id, "store-2");
        assert_eq!(
            backend.product_loads.load(std::sync::atomic::Ordering::SeqCst),
            2
        );

        let err = select_store(&session, &config, "store-9", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_store_switch_drops_coupon_not_run_there() {
        let (backend, session) = session().await;
        let config = ConfigState::default();
        add_to_cart(&session, &config, "COLA-330", 2).await.unwrap();
        apply_coupon(&session, &config, "TENOFF", Utc::now())
            .await
            .unwrap();

        let view = select_store(&session, &config, "store-2", Utc::now()).await.unwrap();

        assert!(view.promotions.is_empty());
        assert!(view.summary.coupon_discount.is_zero());
        assert_eq!(view.summary.grand_total.cents(), 22_000);
        assert_eq!(
            view.notices,
            vec!["Removed from order: Coupon TENOFF is not valid: not found".to_string()]
        );

        place_order(&session, &config, None, None, Utc::now())
            .await
            .unwrap();
        let sales = backend.sales.lock().unwrap();
        assert_eq!(sales[0].store, "store-2");
        assert!(sales[0].coupon.is_none());
    }

    #[tokio::test]
    async fn test_store_switch_keeps_order_without_promotions() {
        let (_backend, session) = session().await;
        let config = ConfigState::default();
        add_to_cart(&session, &config, "COLA-330", 1).await.unwrap();

        let view = select_store(&session, &config, "store-2", Utc::now()).await.unwrap();
        assert!(view.notices.is_empty());
        assert_eq!(view.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let (_backend, session) = session().await;
        let err = select_customer(&session, &ConfigState::default(), Some("c-nobody"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
