//! # Register Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  Operator types "coupon SUMMER10"                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Role check? ──────── CoreError::Forbidden ──────────┐          │  │
//! │  │         │                                            │          │  │
//! │  │         ▼                                            ▼          │  │
//! │  │  Promotion rule? ──── PromotionError::InvalidCoupon ─ ApiError ─►│  │
//! │  │         │                                            ▲          │  │
//! │  │         ▼                                            │          │  │
//! │  │  Backend call? ────── ClientError::Api ──────────────┘          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Register prints:  error [PROMOTION_ERROR] Coupon SUMMER10 is not       │
//! │                    valid: expired                                       │
//! │  The session continues; the order is unchanged.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::error;

use meridian_client::ClientError;
use meridian_core::{CoreError, PromotionError, ValidationError};

/// Error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: COLA-330"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Message shown to the operator
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad input or unmet precondition
    ValidationError,

    /// Coupon, gift card or loyalty rejected
    PromotionError,

    /// Backend unreachable, timed out or returned an error
    NetworkError,

    /// Operator role lacks the permission
    Forbidden,

    /// Unknown product, customer, store or line
    NotFound,

    /// Cart limits
    CartError,

    /// Anything unexpected
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Not-found error for an entity kind and the key that was looked up.
    pub fn not_found(entity: &str, key: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, key))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<PromotionError> for ApiError {
    fn from(err: PromotionError) -> Self {
        ApiError::new(ErrorCode::PromotionError, err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CartTooLarge { .. } | CoreError::QuantityTooLarge { .. } => {
                ApiError::cart(err.to_string())
            }
            CoreError::LineNotFound(line) => ApiError::not_found("Line", &line),
            CoreError::Forbidden { .. } => ApiError::new(ErrorCode::Forbidden, err.to_string()),
            CoreError::Validation(e) => e.into(),
            CoreError::Promotion(e) => e.into(),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Validation(e) => e.into(),
            ClientError::SubmissionInFlight => ApiError::cart(err.to_string()),
            // Backend messages are shown verbatim so the operator can act on them
            ClientError::Api { message, .. } => ApiError::new(ErrorCode::NetworkError, message),
            ClientError::Network(_) | ClientError::Timeout => {
                ApiError::new(ErrorCode::NetworkError, err.to_string())
            }
            other => {
                error!(error = %other, "Backend client failure");
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = serde_json::to_value(self.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.code));
        write!(f, "[{}] {}", code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{Permission, Role};

    #[test]
    fn test_forbidden_maps_to_forbidden_code() {
        let err: ApiError = CoreError::Forbidden {
            role: Role::Cashier,
            permission: Permission::OverrideLineDiscount,
        }
        .into();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.message, "cashier is not allowed to override line discounts");
    }

    #[test]
    fn test_promotion_errors_keep_their_message() {
        let err: ApiError = CoreError::Promotion(PromotionError::NoCustomerSelected).into();
        assert_eq!(err.code, ErrorCode::PromotionError);
        assert_eq!(err.message, "Select a customer before redeeming loyalty points");
    }

    #[test]
    fn test_backend_message_is_verbatim() {
        let err: ApiError = ClientError::Api {
            status: 422,
            message: "Insufficient stock for COLA-330".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert_eq!(err.message, "Insufficient stock for COLA-330");
    }

    #[test]
    fn test_missing_store_through_client_error() {
        let err: ApiError = ClientError::Validation(ValidationError::MissingStore).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Select a store before placing the order");
    }

    #[test]
    fn test_line_not_found() {
        let err: ApiError = CoreError::LineNotFound("abc".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Line not found: abc");
    }

    #[test]
    fn test_display_uses_wire_code() {
        let err = ApiError::cart("Cart cannot have more than 100 items");
        assert_eq!(err.to_string(), "[CART_ERROR] Cart cannot have more than 100 items");
    }

    #[test]
    fn test_serializes_screaming_snake_case() {
        let json = serde_json::to_value(ApiError::not_found("Product", "X")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: X");
    }
}
