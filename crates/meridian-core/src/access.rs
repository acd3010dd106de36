//! # Access Control
//!
//! Role-permission gate for register actions.
//!
//! ## Permission Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Permission              │ super_admin │ admin │ manager │ cashier     │
//! │  ─────────────────────── │ ─────────── │ ───── │ ─────── │ ───────     │
//! │  sell                    │      ✓      │   ✓   │    ✓    │    ✓        │
//! │  apply coupon            │      ✓      │   ✓   │    ✓    │    ✓        │
//! │  redeem gift card        │      ✓      │   ✓   │    ✓    │    ✓        │
//! │  redeem loyalty          │      ✓      │   ✓   │    ✓    │    ✓        │
//! │  hold order              │      ✓      │   ✓   │    ✓    │    ✓        │
//! │  clear order             │      ✓      │   ✓   │    ✓    │    ✓        │
//! │  override line discount  │      ✓      │   ✓   │    ✓    │    ✗        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    #[default]
    Cashier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Sell,
    ApplyCoupon,
    RedeemGiftCard,
    RedeemLoyalty,
    OverrideLineDiscount,
    HoldOrder,
    ClearOrder,
}

impl Role {
    /// Returns true if this role grants `permission`.
    pub fn allows(&self, permission: Permission) -> bool {
        match self {
            Role::SuperAdmin | Role::Admin | Role::Manager => true,
            Role::Cashier => !matches!(permission, Permission::OverrideLineDiscount),
        }
    }
}

/// Fails with [`CoreError::Forbidden`] unless `role` grants `permission`.
pub fn authorize(role: Role, permission: Permission) -> CoreResult<()> {
    if role.allows(permission) {
        Ok(())
    } else {
        Err(CoreError::Forbidden { role, permission })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::SuperAdmin => write!(f, "super_admin"),
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::Cashier => write!(f, "cashier"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "super_admin" | "superadmin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "cashier" => Ok(Role::Cashier),
            other => Err(format!(
                "Unknown role: '{}'. Valid options: super_admin, admin, manager, cashier",
                other
            )),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Permission::Sell => "sell",
            Permission::ApplyCoupon => "apply coupons",
            Permission::RedeemGiftCard => "redeem gift cards",
            Permission::RedeemLoyalty => "redeem loyalty points",
            Permission::OverrideLineDiscount => "override line discounts",
            Permission::HoldOrder => "hold orders",
            Permission::ClearOrder => "clear orders",
        };
        f.write_str(text)
    }
}
