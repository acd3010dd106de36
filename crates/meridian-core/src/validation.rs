//! # Validation Module
//!
//! Input checks run before anything touches the order.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register command parser                                       │
//! │  └── Argument shape (numbers parse, codes present)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Quantities, prices, tax rates within range                         │
//! │  └── Codes (coupon, gift card, SKU) well formed                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Sales backend                                                 │
//! │  └── Authoritative stock, invoice numbering, ledger                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DiscountRule;
use crate::{MAX_ITEM_QUANTITY, MAX_MONEY_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest coupon code, gift card number or SKU accepted.
pub const MAX_CODE_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a lookup code (coupon code, gift card number, SKU, barcode).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_CODE_LEN`] characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Returns
/// The trimmed code.
///
/// ## Example
/// ```rust
/// use meridian_core::validation::validate_code;
///
/// assert_eq!(validate_code("coupon", " SUMMER10 ").unwrap(), "SUMMER10");
/// assert!(validate_code("coupon", "").is_err());
/// assert!(validate_code("coupon", "has space").is_err());
/// ```
pub fn validate_code(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(value.to_string())
}

/// Validates a free-text search query. Empty is allowed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an order note.
pub fn validate_note(note: &str) -> ValidationResult<()> {
    if note.chars().count() > 500 {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: 500,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount within `0..=MAX_MONEY_CENTS`.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.cents() > MAX_MONEY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_CENTS,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    validate_amount("price", price)
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a payment amount. Zero and negative tenders are rejected.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    validate_amount("payment amount", amount)
}

/// Validates a discount rule: percentages within 0-100%, fixed amounts
/// within `0..=MAX_MONEY_CENTS`.
pub fn validate_discount(rule: &DiscountRule) -> ValidationResult<()> {
    match *rule {
        DiscountRule::Percentage { bps } if bps > 10_000 => Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        }),
        DiscountRule::Fixed { amount } if amount.is_negative() => {
            Err(ValidationError::MustBePositive {
                field: "discount".to_string(),
            })
        }
        DiscountRule::Fixed { amount } => validate_amount("discount", amount),
        DiscountRule::Percentage { .. } => Ok(()),
    }
}

/// Validates a loyalty point count for redemption.
pub fn validate_points(points: i64) -> ValidationResult<()> {
    if points <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "points".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
