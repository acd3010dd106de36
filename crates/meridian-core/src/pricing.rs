//! # Pricing Calculator
//!
//! Derives the [`BillingSummary`] from line items, applied promotions and
//! payments. Pure: same input, same summary.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pricing Pipeline                                    │
//! │                                                                         │
//! │  per line:                                                              │
//! │    gross = unit_price × quantity                                        │
//! │    net   = gross - line discount          (clamped to [0, gross])       │
//! │    tax   = exclusive: net × rate                                        │
//! │            inclusive: net × rate / (1 + rate)                           │
//! │    sub   = exclusive: net      inclusive: net - tax                     │
//! │                                                                         │
//! │  order:                                                                 │
//! │    sub_total = Σ sub          tax_total = Σ tax                         │
//! │                                                                         │
//! │    discountable = sub_total                                             │
//! │      coupon   ──► min(coupon value,   discountable) ──► discountable -= │
//! │      loyalty  ──► min(points value,   discountable) ──► discountable -= │
//! │      giftcard ──► min(card balance,   discountable) ──► discountable -= │
//! │                                                                         │
//! │    grand_total = sub_total - discount_total + tax_total                 │
//! │    balance_due = max(grand_total - amount_paid, 0)                      │
//! │    change_due  = max(amount_paid - grand_total, 0)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cap `discount_total <= sub_total` is enforced here and nowhere else,
//! so the order in which promotions were applied cannot break it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, RoundingMode};
use crate::order::OrderLineItem;
use crate::promotion::{AppliedPromotion, Promotions};
use crate::types::{PaymentDetail, TaxMode};

// =============================================================================
// Configuration
// =============================================================================

/// Tax and rounding configuration for one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Rounding applied to per-line tax and percentage discounts.
    #[serde(default)]
    pub rounding: RoundingMode,
}

// =============================================================================
// Line Amounts
// =============================================================================

/// Every derived amount for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineAmounts {
    /// unit price × quantity
    pub gross: Money,
    pub discount: Money,
    /// gross - discount
    pub net: Money,
    pub tax: Money,
    /// Contribution to the order sub total (net without included tax).
    pub sub_total: Money,
    /// What the customer pays for the line: sub_total + tax.
    pub total: Money,
}

/// Prices a single line.
pub fn price_line(line: &OrderLineItem, config: &PricingConfig) -> LineAmounts {
    let mode = config.rounding;
    let gross = line.unit_price.multiply_quantity(line.quantity);
    let discount = line
        .line_discount
        .map(|rule| rule.line_amount(gross, line.quantity, mode))
        .unwrap_or_default();
    let net = gross - discount;

    let (tax, sub_total) = match line.tax_mode {
        TaxMode::Exclusive => (net.exclusive_tax(line.tax_rate, mode), net),
        TaxMode::Inclusive => {
            let tax = net.inclusive_tax(line.tax_rate, mode);
            (tax, net - tax)
        }
    };

    LineAmounts {
        gross,
        discount,
        net,
        tax,
        sub_total,
        total: sub_total + tax,
    }
}

// =============================================================================
// Billing Summary
// =============================================================================

/// Derived totals snapshot for an order.
///
/// Never mutated in place: every order mutation replaces it with a fresh
/// result of [`calculate`].
///
/// ## Invariants
/// - `grand_total == sub_total - discount_total + tax_total`
/// - `0 <= discount_total <= sub_total`
/// - `discount_total == coupon_discount + loyalty_discount + gift_card_discount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub sub_total: Money,
    /// Promotional discounts (coupon + loyalty + gift card).
    pub discount_total: Money,
    pub tax_total: Money,
    pub grand_total: Money,
    pub amount_paid: Money,
    pub balance_due: Money,

    /// Product-level discounts, already netted out of `sub_total`.
    pub line_discount_total: Money,
    pub coupon_discount: Money,
    pub loyalty_discount: Money,
    pub gift_card_discount: Money,
    pub change_due: Money,
    pub item_count: usize,
    pub total_quantity: i64,
}

impl BillingSummary {
    /// True when payments cover the grand total.
    pub fn is_settled(&self) -> bool {
        self.balance_due.is_zero()
    }
}

/// Computes the billing summary for the given order state.
///
/// ## Example
/// ```rust
/// use meridian_core::pricing::{calculate, PricingConfig};
/// use meridian_core::promotion::Promotions;
///
/// let summary = calculate(&[], &Promotions::default(), &[], &PricingConfig::default());
/// assert!(summary.grand_total.is_zero());
/// ```
pub fn calculate(
    lines: &[OrderLineItem],
    promotions: &Promotions,
    payments: &[PaymentDetail],
    config: &PricingConfig,
) -> BillingSummary {
    let mut summary = BillingSummary {
        item_count: lines.len(),
        ..BillingSummary::default()
    };

    for line in lines {
        let amounts = price_line(line, config);
        summary.sub_total += amounts.sub_total;
        summary.tax_total += amounts.tax;
        summary.line_discount_total += amounts.discount;
        summary.total_quantity += line.quantity;
    }

    // Promotions iterate in application order: coupon, loyalty, gift card.
    let mut discountable = summary.sub_total;
    for promotion in promotions.iter() {
        let requested = requested_discount(promotion, summary.sub_total, config);
        let applied = requested.clamp_to(discountable);
        discountable -= applied;

        match promotion {
            AppliedPromotion::Coupon { .. } => summary.coupon_discount = applied,
            AppliedPromotion::Loyalty { .. } => summary.loyalty_discount = applied,
            AppliedPromotion::GiftCard { .. } => summary.gift_card_discount = applied,
        }
    }

    summary.discount_total =
        summary.coupon_discount + summary.loyalty_discount + summary.gift_card_discount;
    summary.grand_total = summary.sub_total - summary.discount_total + summary.tax_total;

    summary.amount_paid = payments.iter().map(|p| p.amount).sum();
    summary.balance_due = summary.grand_total.saturating_sub(summary.amount_paid);
    summary.change_due = summary.amount_paid.saturating_sub(summary.grand_total);

    summary
}

/// What a promotion asks for before the discountable cap is applied.
fn requested_discount(
    promotion: &AppliedPromotion,
    sub_total: Money,
    config: &PricingConfig,
) -> Money {
    match promotion {
        AppliedPromotion::Coupon { coupon, .. } => {
            let below_minimum = coupon.min_purchase.is_some_and(|min| sub_total < min);
            if below_minimum {
                Money::zero()
            } else {
                coupon.discount_for(sub_total, config.rounding)
            }
        }
        AppliedPromotion::Loyalty {
            redemption_value, ..
        } => *redemption_value,
        AppliedPromotion::GiftCard { balance, .. } => *balance,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
