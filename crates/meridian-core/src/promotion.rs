//! # Promotion Appliers
//!
//! Coupons, gift cards and loyalty redemptions validated against
//! pre-fetched reference data and attached to an [`Order`].
//!
//! ## Apply Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  apply_coupon("SUMMER10", &active_coupons, now)                         │
//! │       │                                                                 │
//! │       ├── order empty?             → PromotionError::EmptyOrder          │
//! │       ├── code not in list?        → InvalidCoupon { "not found" }      │
//! │       ├── outside validity window? → InvalidCoupon { "expired", ... }   │
//! │       ├── subtotal < minimum?      → MinimumPurchaseNotMet              │
//! │       │                                                                 │
//! │       └── OK → replace any coupon ──► recompute ──► BillingSummary      │
//! │                                                                         │
//! │  The amount actually granted is decided by the pricing calculator,      │
//! │  which clamps coupon → loyalty → gift card against the subtotal.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only one promotion of each kind is active at a time. Applying a second
//! coupon replaces the first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, PromotionError};
use crate::money::Money;
use crate::order::Order;
use crate::pricing::BillingSummary;
use crate::types::{Coupon, Customer, GiftCard, LoyaltyProgram};
use crate::validation::{validate_code, validate_points};
use crate::MAX_MONEY_CENTS;

// =============================================================================
// Applied Promotion
// =============================================================================

/// Promotion kinds, ordered the way discounts are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    Coupon,
    Loyalty,
    GiftCard,
}

/// A promotion attached to the order.
///
/// `discount_amount` on coupons and gift cards is the amount granted at the
/// last recompute, which may be lower than requested once clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedPromotion {
    Coupon {
        coupon: Coupon,
        #[serde(rename = "discountAmount")]
        discount_amount: Money,
    },
    Loyalty {
        #[serde(rename = "pointsRedeemed")]
        points_redeemed: i64,
        #[serde(rename = "redemptionValue")]
        redemption_value: Money,
    },
    GiftCard {
        number: String,
        /// Card balance when applied; the most this card can cover.
        balance: Money,
        #[serde(rename = "discountAmount")]
        discount_amount: Money,
    },
}

impl AppliedPromotion {
    pub fn kind(&self) -> PromotionKind {
        match self {
            AppliedPromotion::Coupon { .. } => PromotionKind::Coupon,
            AppliedPromotion::Loyalty { .. } => PromotionKind::Loyalty,
            AppliedPromotion::GiftCard { .. } => PromotionKind::GiftCard,
        }
    }
}

/// The set of active promotions, at most one per kind, kept in
/// application order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Promotions(Vec<AppliedPromotion>);

impl Promotions {
    /// Adds `promotion`, replacing one of the same kind. Returns the replaced one.
    pub fn apply(&mut self, promotion: AppliedPromotion) -> Option<AppliedPromotion> {
        let replaced = self.remove(promotion.kind());
        self.0.push(promotion);
        self.0.sort_by_key(AppliedPromotion::kind);
        replaced
    }

    pub fn remove(&mut self, kind: PromotionKind) -> Option<AppliedPromotion> {
        let index = self.0.iter().position(|p| p.kind() == kind)?;
        Some(self.0.remove(index))
    }

    pub fn get(&self, kind: PromotionKind) -> Option<&AppliedPromotion> {
        self.0.iter().find(|p| p.kind() == kind)
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        match self.get(PromotionKind::Coupon) {
            Some(AppliedPromotion::Coupon { coupon, .. }) => Some(coupon),
            _ => None,
        }
    }

    /// Points redeemed by the active loyalty redemption, if any.
    pub fn loyalty_points(&self) -> Option<i64> {
        match self.get(PromotionKind::Loyalty) {
            Some(AppliedPromotion::Loyalty {
                points_redeemed, ..
            }) => Some(*points_redeemed),
            _ => None,
        }
    }

    pub fn gift_card_number(&self) -> Option<&str> {
        match self.get(PromotionKind::GiftCard) {
            Some(AppliedPromotion::GiftCard { number, .. }) => Some(number),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppliedPromotion> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Copies granted amounts from a fresh summary back into the promotions.
    pub(crate) fn record_applied(&mut self, summary: &BillingSummary) {
        for promotion in &mut self.0 {
            match promotion {
                AppliedPromotion::Coupon {
                    discount_amount, ..
                } => *discount_amount = summary.coupon_discount,
                AppliedPromotion::GiftCard {
                    discount_amount, ..
                } => *discount_amount = summary.gift_card_discount,
                AppliedPromotion::Loyalty { .. } => {}
            }
        }
    }
}

// =============================================================================
// Order Operations
// =============================================================================

impl Order {
    /// Applies a coupon from the active-coupon list.
    ///
    /// Lookup ignores case. Percentage coupons follow the subtotal on every
    /// later recompute.
    pub fn apply_coupon(
        &mut self,
        code: &str,
        coupons: &[Coupon],
        now: DateTime<Utc>,
    ) -> CoreResult<BillingSummary> {
        self.ensure_not_empty()?;
        let code = validate_code("coupon code", code)?;

        let coupon = coupons
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(&code))
            .ok_or_else(|| invalid_coupon(&code, "not found"))?;

        if !coupon.is_active {
            return Err(invalid_coupon(&coupon.code, "inactive").into());
        }
        if coupon.starts_at.is_some_and(|start| now < start) {
            return Err(invalid_coupon(&coupon.code, "not yet started").into());
        }
        if !coupon.is_live(now) {
            return Err(invalid_coupon(&coupon.code, "expired").into());
        }
        if let Some(minimum) = coupon.min_purchase {
            if self.summary.sub_total < minimum {
                return Err(PromotionError::MinimumPurchaseNotMet {
                    code: coupon.code.clone(),
                    minimum,
                }
                .into());
            }
        }

        self.promotions.apply(AppliedPromotion::Coupon {
            coupon: coupon.clone(),
            discount_amount: Money::zero(),
        });
        Ok(self.recompute())
    }

    /// Applies a gift card. Its redemption is the lesser of the balance and
    /// what is still discountable after coupon and loyalty.
    pub fn apply_gift_card(
        &mut self,
        number: &str,
        cards: &[GiftCard],
        now: DateTime<Utc>,
    ) -> CoreResult<BillingSummary> {
        self.ensure_not_empty()?;
        let number = validate_code("gift card number", number)?;

        let card = cards
            .iter()
            .find(|c| c.number.eq_ignore_ascii_case(&number))
            .ok_or_else(|| invalid_gift_card(&number, "not found"))?;

        if !card.is_active {
            return Err(invalid_gift_card(&card.number, "inactive").into());
        }
        if card.expires_at.is_some_and(|end| now >= end) {
            return Err(invalid_gift_card(&card.number, "expired").into());
        }
        if !card.is_usable(now) {
            return Err(invalid_gift_card(&card.number, "no balance remaining").into());
        }

        self.promotions.apply(AppliedPromotion::GiftCard {
            number: card.number.clone(),
            balance: card.balance,
            discount_amount: Money::zero(),
        });
        Ok(self.recompute())
    }

    /// Redeems `points` from the selected customer's loyalty balance.
    pub fn apply_loyalty(
        &mut self,
        points: i64,
        program: &LoyaltyProgram,
    ) -> CoreResult<BillingSummary> {
        self.ensure_not_empty()?;

        let available = self
            .customer
            .as_ref()
            .map(|c| c.loyalty_points)
            .ok_or(PromotionError::NoCustomerSelected)?;

        if !program.enabled || program.cents_per_point <= 0 {
            return Err(PromotionError::LoyaltyUnavailable(
                "loyalty program is disabled".to_string(),
            )
            .into());
        }
        validate_points(points)?;
        if points < program.min_redeem_points {
            return Err(PromotionError::BelowMinimumRedemption {
                minimum: program.min_redeem_points,
            }
            .into());
        }
        if points > available {
            return Err(PromotionError::InsufficientLoyaltyPoints {
                requested: points,
                available,
            }
            .into());
        }

        let redemption_value = program
            .redemption_value(points)
            .filter(|value| value.cents() <= MAX_MONEY_CENTS)
            .ok_or_else(|| {
                PromotionError::LoyaltyUnavailable(format!(
                    "{} points exceed the largest redeemable amount",
                    points
                ))
            })?;

        self.promotions.apply(AppliedPromotion::Loyalty {
            points_redeemed: points,
            redemption_value,
        });
        Ok(self.recompute())
    }

    /// Re-checks the applied coupon against a freshly loaded coupon list.
    ///
    /// A coupon that no longer passes [`Order::apply_coupon`] is dropped and
    /// the rejection returned. Otherwise the coupon is replaced by its fresh
    /// definition.
    pub fn revalidate_coupon(
        &mut self,
        coupons: &[Coupon],
        now: DateTime<Utc>,
    ) -> Option<PromotionError> {
        let code = self.promotions.coupon()?.code.clone();
        let previous = self.promotions.remove(PromotionKind::Coupon);

        match self.apply_coupon(&code, coupons, now) {
            Ok(_) => None,
            Err(CoreError::Promotion(err)) if err != PromotionError::EmptyOrder => {
                self.recompute();
                Some(err)
            }
            Err(_) => {
                if let Some(previous) = previous {
                    self.promotions.apply(previous);
                }
                self.recompute();
                None
            }
        }
    }

    /// Replaces the selected customer's snapshot with fresher data for the
    /// same customer. Data for anyone else is ignored.
    ///
    /// A loyalty redemption the new balance no longer covers is dropped and
    /// the rejection returned.
    pub fn refresh_customer(&mut self, customer: Customer) -> Option<PromotionError> {
        if self.customer.as_ref().map(|c| c.id.as_str()) != Some(customer.id.as_str()) {
            return None;
        }

        let available = customer.loyalty_points;
        self.customer = Some(customer);

        let dropped = match self.promotions.loyalty_points() {
            Some(requested) if requested > available => {
                self.promotions.remove(PromotionKind::Loyalty);
                Some(PromotionError::InsufficientLoyaltyPoints {
                    requested,
                    available,
                })
            }
            _ => None,
        };
        self.recompute();
        dropped
    }

    pub fn remove_coupon(&mut self) -> BillingSummary {
        self.promotions.remove(PromotionKind::Coupon);
        self.recompute()
    }

    pub fn remove_gift_card(&mut self) -> BillingSummary {
        self.promotions.remove(PromotionKind::GiftCard);
        self.recompute()
    }

    pub fn remove_loyalty(&mut self) -> BillingSummary {
        self.promotions.remove(PromotionKind::Loyalty);
        self.recompute()
    }

    fn ensure_not_empty(&self) -> Result<(), PromotionError> {
        if self.is_empty() {
            Err(PromotionError::EmptyOrder)
        } else {
            Ok(())
        }
    }
}

fn invalid_coupon(code: &str, reason: &str) -> PromotionError {
    PromotionError::InvalidCoupon {
        code: code.to_string(),
        reason: reason.to_string(),
    }
}

fn invalid_gift_card(number: &str, reason: &str) -> PromotionError {
    PromotionError::InvalidGiftCard {
        number: number.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
