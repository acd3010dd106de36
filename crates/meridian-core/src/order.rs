//! # Order Store
//!
//! The in-progress sale for one register session: selected store and
//! customer, line items, promotions and tenders.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Operations                                     │
//! │                                                                         │
//! │  Operator Action          Order Method            State Change          │
//! │  ───────────────          ────────────            ────────────          │
//! │                                                                         │
//! │  Scan product ───────────► add_item() ──────────► merge or push line    │
//! │  Change quantity ────────► update_quantity() ───► qty = n (≤0 removes)  │
//! │  Remove line ────────────► remove_item() ───────► retain (idempotent)   │
//! │  Clear ──────────────────► clear() ─────────────► lines, promos, tenders│
//! │  Pick store / customer ──► select_store() ...   ► snapshot kept         │
//! │                                                                         │
//! │  Every write ends in recompute() and returns the fresh BillingSummary.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed mutation leaves the order exactly as it was.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{self, BillingSummary, LineAmounts, PricingConfig};
use crate::promotion::{PromotionKind, Promotions};
use crate::types::{
    Customer, DiscountRule, PaymentDetail, Product, ProductVariant, Store, TaxMode, TaxRate,
};
use crate::validation::{
    validate_amount, validate_discount, validate_payment_amount, validate_price,
    validate_tax_rate_bps,
};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// One line of the order.
///
/// Price, tax and discount are frozen when the product is added. Later
/// catalog refreshes do not change lines already in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    /// Session-local id (UUID v4), used by quantity and remove commands.
    pub line_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_rate: TaxRate,
    pub tax_mode: TaxMode,
    pub line_discount: Option<DiscountRule>,
}

impl OrderLineItem {
    /// Snapshots `product` (or one of its variants) into a new line.
    pub fn from_product(product: &Product, variant: Option<&ProductVariant>, quantity: i64) -> Self {
        let (variant_id, name, sku, unit_price) = match variant {
            Some(v) => (
                Some(v.id.clone()),
                format!("{} ({})", product.name, v.name),
                v.sku.clone(),
                v.price,
            ),
            None => (None, product.name.clone(), product.sku.clone(), product.price),
        };

        OrderLineItem {
            line_id: uuid::Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            variant_id,
            name,
            sku,
            unit_price,
            quantity,
            tax_rate: product.tax_rate,
            tax_mode: product.tax_mode,
            line_discount: product.discount,
        }
    }

    fn is_same_item(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }
}

// =============================================================================
// Order
// =============================================================================

/// The cart and everything attached to it.
///
/// ## Invariants
/// - Lines are unique by product + variant
/// - Every line has `1 <= quantity <= MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
/// - `summary` always equals `pricing::calculate` of the current state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub(crate) store: Option<Store>,
    pub(crate) customer: Option<Customer>,
    pub(crate) items: Vec<OrderLineItem>,
    pub(crate) promotions: Promotions,
    pub(crate) payments: Vec<PaymentDetail>,
    pub(crate) config: PricingConfig,
    pub(crate) summary: BillingSummary,
}

impl Order {
    pub fn new(config: PricingConfig) -> Self {
        Order {
            config,
            ..Order::default()
        }
    }

    // -------------------------------------------------------------------------
    // Line items
    // -------------------------------------------------------------------------

    /// Adds `quantity` of a product (or variant).
    ///
    /// ## Behavior
    /// - Same product + variant already present: quantity is incremented
    /// - Otherwise a new line is appended
    /// - `quantity <= 0` changes nothing and returns the current summary
    pub fn add_item(
        &mut self,
        product: &Product,
        variant: Option<&ProductVariant>,
        quantity: i64,
    ) -> CoreResult<BillingSummary> {
        if quantity <= 0 {
            return Ok(self.summary);
        }

        let variant_id = variant.map(|v| v.id.as_str());
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|l| l.is_same_item(&product.id, variant_id))
        {
            let requested = line.quantity + quantity;
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = requested;
            return Ok(self.recompute());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let line = OrderLineItem::from_product(product, variant, quantity);
        validate_price(line.unit_price)?;
        validate_tax_rate_bps(line.tax_rate.bps())?;
        if let Some(rule) = &line.line_discount {
            validate_discount(rule)?;
        }

        self.items.push(line);
        Ok(self.recompute())
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<BillingSummary> {
        if quantity <= 0 {
            if !self.items.iter().any(|l| l.line_id == line_id) {
                return Err(CoreError::LineNotFound(line_id.to_string()));
            }
            return Ok(self.remove_item(line_id));
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let line = self.line_mut(line_id)?;
        line.quantity = quantity;
        Ok(self.recompute())
    }

    /// Removes a line. Unknown ids are ignored.
    pub fn remove_item(&mut self, line_id: &str) -> BillingSummary {
        self.items.retain(|l| l.line_id != line_id);
        self.recompute()
    }

    /// Replaces (or clears) the discount on one line.
    pub fn set_line_discount(
        &mut self,
        line_id: &str,
        discount: Option<DiscountRule>,
    ) -> CoreResult<BillingSummary> {
        if let Some(rule) = &discount {
            validate_discount(rule)?;
        }

        let line = self.line_mut(line_id)?;
        line.line_discount = discount;
        Ok(self.recompute())
    }

    /// Empties lines, promotions and tenders. Store and customer stay.
    pub fn clear(&mut self) -> BillingSummary {
        self.items.clear();
        self.promotions.clear();
        self.payments.clear();
        self.recompute()
    }

    // -------------------------------------------------------------------------
    // Store, customer, payments
    // -------------------------------------------------------------------------

    pub fn select_store(&mut self, store: Store) {
        self.store = Some(store);
    }

    /// Selects (or deselects) the customer.
    ///
    /// A loyalty redemption belongs to the customer who made it, so a
    /// different customer drops it.
    pub fn select_customer(&mut self, customer: Option<Customer>) -> BillingSummary {
        let same = match (&self.customer, &customer) {
            (Some(old), Some(new)) => old.id == new.id,
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.promotions.remove(PromotionKind::Loyalty);
        }
        self.customer = customer;
        self.recompute()
    }

    /// Records a tender. The running total of tenders is bounded like any
    /// single amount.
    pub fn add_payment(&mut self, payment: PaymentDetail) -> CoreResult<BillingSummary> {
        validate_payment_amount(payment.amount)?;
        let tendered = self
            .payments
            .iter()
            .try_fold(payment.amount, |sum, p| sum.checked_add(p.amount))
            .unwrap_or(Money::from_cents(i64::MAX));
        validate_amount("total tendered", tendered)?;
        self.payments.push(payment);
        Ok(self.recompute())
    }

    pub fn clear_payments(&mut self) -> BillingSummary {
        self.payments.clear();
        self.recompute()
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Recalculates the summary and records granted promotion amounts.
    pub fn recompute(&mut self) -> BillingSummary {
        let summary = pricing::calculate(&self.items, &self.promotions, &self.payments, &self.config);
        self.promotions.record_applied(&summary);
        self.summary = summary;
        summary
    }

    pub fn set_pricing_config(&mut self, config: PricingConfig) -> BillingSummary {
        self.config = config;
        self.recompute()
    }

    /// Derived amounts for one line.
    pub fn line_amounts(&self, line: &OrderLineItem) -> LineAmounts {
        pricing::price_line(line, &self.config)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    pub fn line(&self, line_id: &str) -> Option<&OrderLineItem> {
        self.items.iter().find(|l| l.line_id == line_id)
    }

    pub fn promotions(&self) -> &Promotions {
        &self.promotions
    }

    pub fn payments(&self) -> &[PaymentDetail] {
        &self.payments
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn summary(&self) -> BillingSummary {
        self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn line_mut(&mut self, line_id: &str) -> CoreResult<&mut OrderLineItem> {
        self.items
            .iter_mut()
            .find(|l| l.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
