//! # Domain Types
//!
//! Reference data fetched from the sales backend, plus the small value
//! types the order and pricing modules are built from.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Backend-owned (snapshots)       Value types                            │
//! │  ─────────────────────────       ───────────                            │
//! │  Store      Customer             TaxRate (bps)     TaxMode              │
//! │  Product ─► ProductVariant       DiscountRule      SaleStatus           │
//! │  Category   Coupon               PaymentMethod     PaymentDetail        │
//! │  GiftCard   LoyaltyProgram                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The register never owns backend records. It holds snapshots taken when
//! reference data was loaded and sends ids back on checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, RoundingMode};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% and 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for config input only).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Whether a quoted price already contains tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// Price + tax shown separately. Tax is added on top.
    #[default]
    Exclusive,
    /// Price includes tax. Tax is extracted from the price.
    Inclusive,
}

// =============================================================================
// Discount Rule
// =============================================================================

/// A discount definition shared by products (line level) and coupons
/// (order level).
///
/// ## Interpretation
/// - On a line, `Fixed` is an amount off **each unit**.
/// - On a coupon, `Fixed` is an amount off **the order**.
/// - `Percentage` is always a share of the base it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountRule {
    Percentage { bps: u32 },
    Fixed { amount: Money },
}

impl DiscountRule {
    /// Discount produced against `base`, never negative and never above `base`.
    pub fn amount_against(&self, base: Money, mode: RoundingMode) -> Money {
        let raw = match *self {
            DiscountRule::Percentage { bps } => base.percentage(bps, mode),
            DiscountRule::Fixed { amount } => amount,
        };
        raw.clamp_to(base)
    }

    /// Line-level discount: fixed amounts apply per unit.
    ///
    /// A per-unit amount too large to multiply out discounts the whole line.
    pub fn line_amount(&self, gross: Money, quantity: i64, mode: RoundingMode) -> Money {
        match *self {
            DiscountRule::Fixed { amount } => amount
                .checked_mul(quantity)
                .map_or(gross, |total| total.clamp_to(gross)),
            DiscountRule::Percentage { .. } => self.amount_against(gross, mode),
        }
    }
}

// =============================================================================
// Store & Category
// =============================================================================

/// A store (branch) the register can sell from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale in the current store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub tax_rate: TaxRate,
    #[serde(default)]
    pub tax_mode: TaxMode,
    /// Product-level discount, copied onto each line at add time.
    #[serde(default)]
    pub discount: Option<DiscountRule>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Product {
    /// Finds a variant by id.
    pub fn variant(&self, variant_id: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// True when `code` equals the SKU or barcode, ignoring case.
    pub fn matches_code(&self, code: &str) -> bool {
        self.sku.eq_ignore_ascii_case(code)
            || self
                .barcode
                .as_deref()
                .is_some_and(|b| b.eq_ignore_ascii_case(code))
    }
}

/// A sellable variant (size, colour) with its own SKU and price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: Money,
}

// =============================================================================
// Customer & Loyalty
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Redeemable loyalty balance.
    #[serde(default)]
    pub loyalty_points: i64,
}

/// Store-wide loyalty settings.
///
/// ```text
/// redeem:  points × cents_per_point           = discount
/// earn:    grand_total / spend_per_point_cents = points (floored)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyProgram {
    pub enabled: bool,
    pub cents_per_point: i64,
    #[serde(default)]
    pub min_redeem_points: i64,
    /// Spend (in cents) that earns one point. Zero disables earning.
    #[serde(default)]
    pub spend_per_point_cents: i64,
}

impl LoyaltyProgram {
    /// Redemption value of `points`, or `None` when it overflows.
    pub fn redemption_value(&self, points: i64) -> Option<Money> {
        Money::from_cents(self.cents_per_point.max(0)).checked_mul(points.max(0))
    }

    /// Points earned on a sale of `total`.
    pub fn points_earned(&self, total: Money) -> i64 {
        if !self.enabled || self.spend_per_point_cents <= 0 || !total.is_positive() {
            return 0;
        }
        total.cents() / self.spend_per_point_cents
    }
}

impl Default for LoyaltyProgram {
    fn default() -> Self {
        LoyaltyProgram {
            enabled: false,
            cents_per_point: 0,
            min_redeem_points: 0,
            spend_per_point_cents: 0,
        }
    }
}

// =============================================================================
// Coupon & Gift Card
// =============================================================================

/// A coupon as published by the backend's active-coupon list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub rule: DiscountRule,
    /// Minimum subtotal required to use the coupon.
    #[serde(default)]
    pub min_purchase: Option<Money>,
    /// Upper bound on the discount (for percentage coupons).
    #[serde(default)]
    pub max_discount: Option<Money>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Coupon {
    /// True when the coupon is active and `now` is inside its window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.map_or(true, |start| now >= start)
            && self.expires_at.map_or(true, |end| now < end)
    }

    /// Discount this coupon grants against `subtotal`, honouring the cap.
    pub fn discount_for(&self, subtotal: Money, mode: RoundingMode) -> Money {
        let amount = self.rule.amount_against(subtotal, mode);
        match self.max_discount {
            Some(cap) => amount.clamp_to(cap),
            None => amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GiftCard {
    pub number: String,
    pub balance: Money,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl GiftCard {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.balance.is_positive()
            && self.expires_at.map_or(true, |end| now < end)
    }
}

// =============================================================================
// Sale Status & Payments
// =============================================================================

/// Status the backend records the sale under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Paid and finished.
    #[default]
    Completed,
    /// Goods handed over, balance still due.
    Pending,
    /// Parked for later (hold order).
    Draft,
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" | "complete" | "paid" => Ok(SaleStatus::Completed),
            "pending" | "due" => Ok(SaleStatus::Pending),
            "draft" | "hold" => Ok(SaleStatus::Draft),
            other => Err(format!("unknown sale status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
    Other,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "mobile" | "wallet" => Ok(PaymentMethod::Mobile),
            "other" => Ok(PaymentMethod::Other),
            other => Err(format!("unknown payment method '{}'", other)),
        }
    }
}

/// One tender toward the order.
///
/// For cash, `received` is what the customer handed over and `change` what
/// went back; `amount` is the part applied to the sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    pub method: PaymentMethod,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl PaymentDetail {
    /// A non-cash tender for `amount`.
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        PaymentDetail {
            method,
            amount,
            received: None,
            change: None,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(rule: DiscountRule) -> Coupon {
        Coupon {
            code: "SAVE".into(),
            rule,
            min_purchase: None,
            max_discount: None,
            starts_at: None,
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert!((TaxRate::from_bps(1000).percentage() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_line_discount_fixed_is_per_unit() {
        let rule = DiscountRule::Fixed {
            amount: Money::from_cents(150),
        };
        let gross = Money::from_cents(1000);
        assert_eq!(rule.line_amount(gross, 4, RoundingMode::HalfUp).cents(), 600);
        // never more than the line itself
        assert_eq!(rule.line_amount(gross, 10, RoundingMode::HalfUp).cents(), 1000);

        let huge = DiscountRule::Fixed {
            amount: Money::from_cents(i64::MAX / 2 + 1),
        };
        assert_eq!(huge.line_amount(gross, 2, RoundingMode::HalfUp).cents(), 1000);
    }

    #[test]
    fn test_coupon_window() {
        let now = Utc::now();
        let mut c = coupon(DiscountRule::Percentage { bps: 1000 });
        assert!(c.is_live(now));

        c.expires_at = Some(now - Duration::hours(1));
        assert!(!c.is_live(now));

        c.expires_at = None;
        c.starts_at = Some(now + Duration::hours(1));
        assert!(!c.is_live(now));

        c.starts_at = None;
        c.is_active = false;
        assert!(!c.is_live(now));
    }

    #[test]
    fn test_coupon_cap() {
        let mut c = coupon(DiscountRule::Percentage { bps: 5000 });
        c.max_discount = Some(Money::from_cents(300));
        let discount = c.discount_for(Money::from_cents(10_000), RoundingMode::HalfUp);
        assert_eq!(discount.cents(), 300);
    }

    #[test]
    fn test_loyalty_points() {
        let program = LoyaltyProgram {
            enabled: true,
            cents_per_point: 5,
            min_redeem_points: 10,
            spend_per_point_cents: 1000,
        };
        assert_eq!(program.redemption_value(40), Some(Money::from_cents(200)));
        assert_eq!(program.redemption_value(i64::MAX), None);
        assert_eq!(program.points_earned(Money::from_cents(4_599)), 4);
        assert_eq!(program.points_earned(Money::zero()), 0);
    }

    #[test]
    fn test_product_matches_code() {
        let product = Product {
            id: "p1".into(),
            sku: "COKE-330".into(),
            barcode: Some("5449000000996".into()),
            name: "Coca-Cola 330ml".into(),
            category_id: None,
            price: Money::from_cents(199),
            tax_rate: TaxRate::zero(),
            tax_mode: TaxMode::Exclusive,
            discount: None,
            variants: vec![],
            is_active: true,
        };
        assert!(product.matches_code("coke-330"));
        assert!(product.matches_code("5449000000996"));
        assert!(!product.matches_code("PEPSI"));
    }

    #[test]
    fn test_sale_status_parse() {
        assert_eq!("hold".parse::<SaleStatus>().unwrap(), SaleStatus::Draft);
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
        assert!("shipped".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_discount_rule_wire_format() {
        let json = serde_json::to_value(DiscountRule::Percentage { bps: 1000 }).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "percentage", "bps": 1000 }));
    }
}
