//! # Error Types
//!
//! Domain-specific error types for meridian-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  meridian-core errors (this file)                                      │
//! │  ├── CoreError        - Cart limits, missing lines, permissions        │
//! │  ├── ValidationError  - Missing store, empty order, bad input          │
//! │  └── PromotionError   - Coupon / gift card / loyalty rejections        │
//! │                                                                         │
//! │  meridian-client errors (separate crate)                               │
//! │  └── ClientError      - Network and backend failures                   │
//! │                                                                         │
//! │  Register errors (in app)                                              │
//! │  └── ApiError         - What the operator sees                         │
//! │                                                                         │
//! │  Flow: ValidationError/PromotionError → CoreError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable: the order is left exactly as it was before
//! the failing call.

use thiserror::Error;

use crate::access::{Permission, Role};
use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Order and business-rule errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity above the per-line maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// No line with this id in the order.
    #[error("Line not found in order: {0}")]
    LineNotFound(String),

    /// The operator's role does not grant this action.
    #[error("{role} is not allowed to {permission}")]
    Forbidden { role: Role, permission: Permission },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Promotion error: {0}")]
    Promotion(#[from] PromotionError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input and precondition failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Checkout attempted with no store selected.
    #[error("Select a store before placing the order")]
    MissingStore,

    /// Checkout attempted with no line items.
    #[error("Order has no items")]
    EmptyOrder,

    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Promotion Error
// =============================================================================

/// Why a promotion could not be applied.
///
/// ## User Workflow
/// ```text
/// Cashier scans coupon "SUMMER10"
///      │
///      ▼
/// apply_coupon("SUMMER10") ──► not in active list / expired
///      │
///      ▼
/// InvalidCoupon { code: "SUMMER10", reason: "expired" }
///      │
///      ▼
/// Register shows: "Coupon SUMMER10 is not valid: expired"
/// ```
#[derive(Debug, Error, PartialEq)]
pub enum PromotionError {
    #[error("Coupon {code} is not valid: {reason}")]
    InvalidCoupon { code: String, reason: String },

    #[error("Coupon {code} requires a subtotal of at least {minimum}")]
    MinimumPurchaseNotMet { code: String, minimum: Money },

    #[error("Gift card {number} is not valid: {reason}")]
    InvalidGiftCard { number: String, reason: String },

    #[error("Select a customer before redeeming loyalty points")]
    NoCustomerSelected,

    #[error("Loyalty redemption is not available: {0}")]
    LoyaltyUnavailable(String),

    #[error("Insufficient loyalty points: requested {requested}, available {available}")]
    InsufficientLoyaltyPoints { requested: i64, available: i64 },

    #[error("At least {minimum} points must be redeemed")]
    BelowMinimumRedemption { minimum: i64 },

    #[error("Promotions need at least one item in the order")]
    EmptyOrder,
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;
