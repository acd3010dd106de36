//! # meridian-core: Checkout Logic for the Meridian Register
//!
//! Everything the register decides about a sale, as pure functions with no
//! I/O: the cart, its prices, its promotions and the payload sent to the
//! sales backend.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Meridian POS Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Register (apps/register)                      │   │
//! │  │    add ──► qty ──► coupon ──► pay ──► place ──► receipt          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ meridian-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │  order  │ │ pricing │ │ promotion │ │ checkout │ │ access │ │   │
//! │  │   │  lines  │ │ summary │ │  coupon   │ │ payload  │ │ roles  │ │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO IMPLICIT CLOCK                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              meridian-client (sales backend over HTTP)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`order`] - The cart: lines, store/customer selection, payments
//! - [`pricing`] - Billing summary calculation
//! - [`promotion`] - Coupon, gift card and loyalty appliers
//! - [`checkout`] - Create-sale payload assembly
//! - [`access`] - Role-permission gate
//! - [`types`] - Reference data and value types
//! - [`money`] - Integer-cent money and rounding
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use meridian_core::{Money, Order, Product, TaxMode, TaxRate};
//!
//! let product = Product {
//!     id: "p1".into(),
//!     sku: "SKU-1".into(),
//!     barcode: None,
//!     name: "Widget".into(),
//!     category_id: None,
//!     price: Money::from_cents(10_000),
//!     tax_rate: TaxRate::from_bps(1000),
//!     tax_mode: TaxMode::Exclusive,
//!     discount: None,
//!     variants: vec![],
//!     is_active: true,
//! };
//!
//! let mut order = Order::default();
//! let summary = order.add_item(&product, None, 2).unwrap();
//! assert_eq!(summary.grand_total.cents(), 22_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod checkout;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod promotion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{authorize, Permission, Role};
pub use checkout::{build_sale_request, CashTender, CreateSaleRequest, PlaceOrder, SaleRecord};
pub use error::{CoreError, CoreResult, PromotionError, ValidationError};
pub use money::{Money, RoundingMode};
pub use order::{Order, OrderLineItem};
pub use pricing::{BillingSummary, PricingConfig};
pub use promotion::{AppliedPromotion, PromotionKind, Promotions};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches keying mistakes such as 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single amount, in cents, accepted anywhere money enters the order
/// (prices, fixed discounts, tenders, cash received).
///
/// With at most [`MAX_CART_ITEMS`] lines of [`MAX_ITEM_QUANTITY`] units the
/// order totals stay well inside `i64`.
pub const MAX_MONEY_CENTS: i64 = 100_000_000_000;
