//! # Configuration State
//!
//! Register-side settings: how money is shown, how it is rounded, and who is
//! operating the till.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--role`)
//! 2. Environment variables (`MERIDIAN_*`)
//! 3. Defaults (this file)
//!
//! Backend settings (URL, token, store) live in `meridian_client::BackendConfig`.
//!
//! Read-only after startup, so no mutex.

use serde::{Deserialize, Serialize};
use tracing::warn;

use meridian_core::{Money, PricingConfig, Role, RoundingMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Shown on receipts and in the cart view
    pub operator: String,

    /// Decides which commands the operator may run
    pub role: Role,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Rounding applied to per-line tax and percentage discounts
    pub rounding: RoundingMode,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            operator: "cashier".to_string(),
            role: Role::Cashier,
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            rounding: RoundingMode::HalfUp,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `MERIDIAN_OPERATOR`: operator name
    /// - `MERIDIAN_ROLE`: `super_admin`, `admin`, `manager` or `cashier`
    /// - `MERIDIAN_CURRENCY_SYMBOL`: e.g. `€`
    /// - `MERIDIAN_CURRENCY_DECIMALS`: `0` to `4`
    /// - `MERIDIAN_ROUNDING`: `half_up` or `half_even`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConfigState::default();

        if let Some(operator) = lookup("MERIDIAN_OPERATOR") {
            config.operator = operator;
        }

        if let Some(role) = lookup("MERIDIAN_ROLE") {
            match role.parse() {
                Ok(role) => config.role = role,
                Err(e) => warn!(error = %e, "Ignoring MERIDIAN_ROLE"),
            }
        }

        if let Some(symbol) = lookup("MERIDIAN_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(decimals) = lookup("MERIDIAN_CURRENCY_DECIMALS") {
            match decimals.parse::<u8>() {
                Ok(d) if d <= 4 => config.currency_decimals = d,
                _ => warn!(value = %decimals, "Ignoring invalid MERIDIAN_CURRENCY_DECIMALS"),
            }
        }

        if let Some(rounding) = lookup("MERIDIAN_ROUNDING") {
            match rounding.parse() {
                Ok(mode) => config.rounding = mode,
                Err(e) => warn!(error = %e, "Ignoring MERIDIAN_ROUNDING"),
            }
        }

        config
    }

    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            rounding: self.rounding,
        }
    }

    /// Formats an amount in minor units as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = (cents / divisor).abs();
        let frac = (cents % divisor).abs();
        let sign = if cents < 0 { "-" } else { "" };

        if self.currency_decimals > 0 {
            format!(
                "{}{}{}.{:0width$}",
                sign,
                self.currency_symbol,
                whole,
                frac,
                width = self.currency_decimals as usize
            )
        } else {
            format!("{}{}{}", sign, self.currency_symbol, whole)
        }
    }

    /// Parses an operator-typed amount ("12", "12.5", "12.50") into minor
    /// units. Returns `None` for anything else, including too many decimals.
    pub fn parse_amount(&self, input: &str) -> Option<Money> {
        let input = input.trim().trim_start_matches(self.currency_symbol.as_str());
        let (whole, frac) = match input.split_once('.') {
            Some((w, f)) => (w, f),
            None => (input, ""),
        };
        let decimals = self.currency_decimals as usize;
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > decimals || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<width$}", frac, width = decimals).parse().ok()?
        };
        let cents = whole
            .checked_mul(10_i64.pow(decimals as u32))?
            .checked_add(frac)?;
        Some(Money::from_cents(cents))
    }
}
