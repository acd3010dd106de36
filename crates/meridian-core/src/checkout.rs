//! # Checkout Payload
//!
//! Turns an [`Order`] into the create-sale request the backend expects.
//! Sending it is the client crate's job; this module only decides whether
//! the order can be placed and what the payload looks like.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  build_sale_request(order, PlaceOrder { cash, status, note })           │
//! │       │                                                                 │
//! │       ├── no store?  → ValidationError::MissingStore                    │
//! │       ├── no lines?  → ValidationError::EmptyOrder                      │
//! │       │                                                                 │
//! │       ├── recorded payments + cash tender → payment_details             │
//! │       │       cash.amount = min(received, balance due)                  │
//! │       │       cash.change = received - amount                           │
//! │       │                                                                 │
//! │       └── CreateSaleRequest { clientReference, products, summary, ... } │
//! │                                                                         │
//! │  The order itself is never modified here.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::order::Order;
use crate::pricing::{self, BillingSummary};
use crate::promotion::AppliedPromotion;
use crate::types::{LoyaltyProgram, PaymentDetail, PaymentMethod, SaleStatus, TaxMode};
use crate::validation::{validate_amount, validate_note};

// =============================================================================
// Input
// =============================================================================

/// Cash handed over by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashTender {
    pub received: Money,
}

/// Operator input for placing an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[serde(default)]
    pub cash: Option<CashTender>,
    #[serde(default)]
    pub status: SaleStatus,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// Wire Payload
// =============================================================================

/// One sold line, in the backend's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_rate_bps: u32,
    pub tax_mode: TaxMode,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponUsage {
    pub code: String,
    pub discount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyUsage {
    pub points_redeemed: i64,
    pub discount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardUsage {
    pub number: String,
    pub amount: Money,
}

/// Body of `POST /sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    /// Generated per attempt so the backend can drop duplicates.
    pub client_reference: String,
    pub store: String,
    pub customer: Option<String>,
    pub products: Vec<SaleLine>,
    pub billing_summary: BillingSummary,
    pub payment_details: Vec<PaymentDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<CouponUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty: Option<LoyaltyUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_card: Option<GiftCardUsage>,
    pub sale_status: SaleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub points_earned: i64,
}

/// What the backend returns for a created sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub invoice_number: String,
}

// =============================================================================
// Builder
// =============================================================================

/// Checks preconditions and assembles the create-sale payload.
///
/// `loyalty` is used only to compute points earned; pass `None` when the
/// store has no program.
pub fn build_sale_request(
    order: &Order,
    place: &PlaceOrder,
    loyalty: Option<&LoyaltyProgram>,
) -> Result<CreateSaleRequest, ValidationError> {
    let store = order.store().ok_or(ValidationError::MissingStore)?;
    if order.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    if let Some(note) = &place.note {
        validate_note(note)?;
    }

    let mut payments = order.payments().to_vec();
    let due_before_cash = order.summary().balance_due;
    let mut cash_applied = false;
    if let Some(cash) = place.cash {
        if cash.received.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "cash received".to_string(),
            });
        }
        validate_amount("cash received", cash.received)?;
        // Nothing left to pay: the cash is not a tender.
        if cash.received.is_positive() && due_before_cash.is_positive() {
            cash_applied = true;
            let applied = cash.received.clamp_to(due_before_cash);
            payments.push(PaymentDetail {
                method: PaymentMethod::Cash,
                amount: applied,
                received: Some(cash.received),
                change: Some(cash.received - applied),
                reference: None,
            });
        }
    }

    let mut summary = pricing::calculate(
        order.items(),
        order.promotions(),
        &payments,
        order.config(),
    );
    if let Some(cash) = place.cash.filter(|_| cash_applied) {
        // Change handed back is reported even though only the applied part
        // counts as paid.
        summary.change_due = cash.received.saturating_sub(due_before_cash);
    }

    let products = order
        .items()
        .iter()
        .map(|line| {
            let amounts = order.line_amounts(line);
            SaleLine {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                name: line.name.clone(),
                sku: line.sku.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                tax_rate_bps: line.tax_rate.bps(),
                tax_mode: line.tax_mode,
                discount: amounts.discount,
                tax: amounts.tax,
                total: amounts.total,
            }
        })
        .collect();

    let mut coupon = None;
    let mut loyalty_usage = None;
    let mut gift_card = None;
    for promotion in order.promotions().iter() {
        match promotion {
            AppliedPromotion::Coupon { coupon: c, .. } => {
                coupon = Some(CouponUsage {
                    code: c.code.clone(),
                    discount: summary.coupon_discount,
                })
            }
            AppliedPromotion::Loyalty {
                points_redeemed, ..
            } => {
                loyalty_usage = Some(LoyaltyUsage {
                    points_redeemed: *points_redeemed,
                    discount: summary.loyalty_discount,
                })
            }
            AppliedPromotion::GiftCard { number, .. } => {
                gift_card = Some(GiftCardUsage {
                    number: number.clone(),
                    amount: summary.gift_card_discount,
                })
            }
        }
    }

    let points_earned = match (order.customer(), loyalty) {
        (Some(_), Some(program)) => program.points_earned(summary.grand_total),
        _ => 0,
    };

    Ok(CreateSaleRequest {
        client_reference: uuid::Uuid::new_v4().to_string(),
        store: store.id.clone(),
        customer: order.customer().map(|c| c.id.clone()),
        products,
        billing_summary: summary,
        payment_details: payments,
        coupon,
        loyalty: loyalty_usage,
        gift_card,
        sale_status: place.status,
        note: place.note.clone(),
        points_earned,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coupon, Customer, DiscountRule, Product, Store, TaxRate};
    use chrono::Utc;

    fn product(cents: i64, bps: u32) -> Product {
        Product {
            id: "p1".into(),
            sku: "SKU-1".into(),
            barcode: None,
            name: "Widget".into(),
            category_id: None,
            price: Money::from_cents(cents),
            tax_rate: TaxRate::from_bps(bps),
            tax_mode: TaxMode::Exclusive,
            discount: None,
            variants: vec![],
            is_active: true,
        }
    }

    fn store() -> Store {
        Store {
            id: "st1".into(),
            name: "Main Street".into(),
            address: None,
            phone: None,
            is_active: true,
        }
    }

    fn ready_order() -> Order {
        let mut order = Order::default();
        order.select_store(store());
        order.add_item(&product(10_000, 1000), None, 2).unwrap();
        order
    }

    #[test]
    fn test_missing_store() {
        let mut order = Order::default();
        order.add_item(&product(1_000, 0), None, 1).unwrap();
        let before = order.summary();

        let err = build_sale_request(&order, &PlaceOrder::default(), None).unwrap_err();
        assert!(matches!(err, ValidationError::MissingStore));
        assert_eq!(order.summary(), before);
        assert_eq!(order.items().len(), 1);
    }

    #[test]
    fn test_empty_order() {
        let mut order = Order::default();
        order.select_store(store());
        let err = build_sale_request(&order, &PlaceOrder::default(), None).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyOrder));
    }

    #[test]
    fn test_cash_tender_records_change() {
        let order = ready_order();
        let place = PlaceOrder {
            cash: Some(CashTender {
                received: Money::from_cents(25_000),
            }),
            ..PlaceOrder::default()
        };

        let request = build_sale_request(&order, &place, None).unwrap();

        assert_eq!(request.payment_details.len(), 1);
        let cash = &request.payment_details[0];
        assert_eq!(cash.method, PaymentMethod::Cash);
        assert_eq!(cash.amount.cents(), 22_000);
        assert_eq!(cash.received.unwrap().cents(), 25_000);
        assert_eq!(cash.change.unwrap().cents(), 3_000);
        assert!(request.billing_summary.balance_due.is_zero());
        assert_eq!(request.billing_summary.change_due.cents(), 3_000);
        // order untouched
        assert!(order.payments().is_empty());
    }

    #[test]
    fn test_cash_ignored_when_payments_cover_total() {
        let mut order = ready_order();
        order
            .add_payment(PaymentDetail::new(PaymentMethod::Card, Money::from_cents(22_000)))
            .unwrap();
        let place = PlaceOrder {
            cash: Some(CashTender {
                received: Money::from_cents(5_000),
            }),
            ..PlaceOrder::default()
        };

        let request = build_sale_request(&order, &place, None).unwrap();

        assert_eq!(request.payment_details.len(), 1);
        assert_eq!(request.payment_details[0].method, PaymentMethod::Card);
        assert!(request.billing_summary.balance_due.is_zero());
        assert!(request.billing_summary.change_due.is_zero());
    }

    #[test]
    fn test_oversized_cash_rejected() {
        let order = ready_order();
        let place = PlaceOrder {
            cash: Some(CashTender {
                received: Money::from_cents(i64::MAX),
            }),
            ..PlaceOrder::default()
        };

        let err = build_sale_request(&order, &place, None).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_partial_cash_leaves_balance() {
        let order = ready_order();
        let place = PlaceOrder {
            cash: Some(CashTender {
                received: Money::from_cents(5_000),
            }),
            status: SaleStatus::Pending,
            note: None,
        };
        let request = build_sale_request(&order, &place, None).unwrap();
        assert_eq!(request.billing_summary.balance_due.cents(), 17_000);
        assert_eq!(request.sale_status, SaleStatus::Pending);
    }

    #[test]
    fn test_payload_carries_promotions_and_points() {
        let mut order = ready_order();
        order.select_customer(Some(Customer {
            id: "c1".into(),
            name: "Ada".into(),
            phone: None,
            email: None,
            loyalty_points: 0,
        }));
        let coupons = vec![Coupon {
            code: "TEN".into(),
            rule: DiscountRule::Percentage { bps: 1000 },
            min_purchase: None,
            max_discount: None,
            starts_at: None,
            expires_at: None,
            is_active: true,
        }];
        order.apply_coupon("TEN", &coupons, Utc::now()).unwrap();
        let program = LoyaltyProgram {
            enabled: true,
            cents_per_point: 1,
            min_redeem_points: 0,
            spend_per_point_cents: 1_000,
        };

        let request = build_sale_request(&order, &PlaceOrder::default(), Some(&program)).unwrap();

        assert_eq!(request.store, "st1");
        assert_eq!(request.customer.as_deref(), Some("c1"));
        assert_eq!(request.coupon.as_ref().unwrap().discount.cents(), 2_000);
        assert_eq!(request.billing_summary.grand_total.cents(), 20_000);
        assert_eq!(request.points_earned, 20);
        assert_eq!(request.products[0].total.cents(), 22_000);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let order = ready_order();
        let request = build_sale_request(&order, &PlaceOrder::default(), None).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("clientReference").is_some());
        assert!(json.get("billingSummary").is_some());
        assert_eq!(json["saleStatus"], "completed");
        assert_eq!(json["billingSummary"]["grandTotal"], 22_000);
        assert_eq!(json["products"][0]["productId"], "p1");
        assert!(json.get("coupon").is_none());
    }

    #[test]
    fn test_client_reference_is_fresh_per_attempt() {
        let order = ready_order();
        let a = build_sale_request(&order, &PlaceOrder::default(), None).unwrap();
        let b = build_sale_request(&order, &PlaceOrder::default(), None).unwrap();
        assert_ne!(a.client_reference, b.client_reference);
    }
}
