//! # Receipt Rendering
//!
//! Plain-text views for a 42-column receipt printer and the terminal.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               Main Street                │
//! │ Invoice                         INV-0001 │
//! │ 2026-10-16 14:03             Cashier Ada │
//! │ ──────────────────────────────────────── │
//! │ Cola 330ml                               │
//! │   2 x $100.00                    $220.00 │
//! │ ──────────────────────────────────────── │
//! │ Subtotal                         $200.00 │
//! │ Coupon TENOFF                    -$20.00 │
//! │ Tax                               $20.00 │
//! │ TOTAL                            $200.00 │
//! │ Cash                             $200.00 │
//! │ Change                            $50.00 │
//! └──────────────────────────────────────────┘
//! ```

use meridian_client::SaleReceipt;
use meridian_core::{
    AppliedPromotion, BillingSummary, Money, PaymentDetail, PaymentMethod, Store,
};

use crate::commands::cart::CartView;
use crate::commands::catalog::ProductHit;
use crate::state::ConfigState;

pub const RECEIPT_WIDTH: usize = 42;

/// Left text and right-aligned value on one row. Falls back to two rows
/// when both do not fit.
fn row(left: &str, right: &str) -> String {
    let used = left.chars().count() + right.chars().count();
    if used < RECEIPT_WIDTH {
        format!("{}{}{}", left, " ".repeat(RECEIPT_WIDTH - used), right)
    } else {
        format!("{}\n{:>width$}", left, right, width = RECEIPT_WIDTH)
    }
}

fn centered(text: &str) -> String {
    format!("{:^width$}", text, width = RECEIPT_WIDTH)
}

fn rule() -> String {
    "-".repeat(RECEIPT_WIDTH)
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::Card => "Card",
        PaymentMethod::Mobile => "Mobile",
        PaymentMethod::Other => "Other",
    }
}

/// Discount rows for the promotions on an open order.
fn promotion_rows(
    promotions: &[AppliedPromotion],
    summary: &BillingSummary,
) -> Vec<(String, Money)> {
    promotions
        .iter()
        .map(|promotion| match promotion {
            AppliedPromotion::Coupon { coupon, .. } => {
                (format!("Coupon {}", coupon.code), summary.coupon_discount)
            }
            AppliedPromotion::Loyalty {
                points_redeemed, ..
            } => (
                format!("Loyalty ({} pts)", points_redeemed),
                summary.loyalty_discount,
            ),
            AppliedPromotion::GiftCard { number, .. } => {
                (format!("Gift card {}", number), summary.gift_card_discount)
            }
        })
        .collect()
}

fn push_summary(
    out: &mut Vec<String>,
    summary: &BillingSummary,
    discounts: &[(String, Money)],
    config: &ConfigState,
) {
    out.push(row("Subtotal", &config.format_currency(summary.sub_total)));
    for (label, amount) in discounts {
        out.push(row(label, &format!("-{}", config.format_currency(*amount))));
    }
    out.push(row("Tax", &config.format_currency(summary.tax_total)));
    out.push(row("TOTAL", &config.format_currency(summary.grand_total)));
}

fn push_payments(out: &mut Vec<String>, payments: &[PaymentDetail], config: &ConfigState) {
    for payment in payments {
        let label = match &payment.reference {
            Some(reference) => format!("{} ({})", method_label(payment.method), reference),
            None => method_label(payment.method).to_string(),
        };
        out.push(row(&label, &config.format_currency(payment.amount)));
    }
}

/// The order as the operator sees it between commands.
pub fn render_cart(view: &CartView, config: &ConfigState) -> String {
    let mut out = Vec::new();
    out.push(row(
        view.store.as_deref().unwrap_or("(no store)"),
        view.customer.as_deref().unwrap_or("walk-in"),
    ));
    out.push(rule());

    if view.lines.is_empty() {
        out.push(centered("Cart is empty"));
    }
    for line in &view.lines {
        out.push(row(
            &format!("{}. {}", line.index, line.name),
            &config.format_currency(line.total),
        ));
        let mut detail = format!(
            "   {} x {}",
            line.quantity,
            config.format_currency(line.unit_price)
        );
        if line.discount.is_positive() {
            detail.push_str(&format!(" less {}", config.format_currency(line.discount)));
        }
        out.push(detail);
    }

    out.push(rule());
    let discounts = promotion_rows(&view.promotions, &view.summary);
    push_summary(&mut out, &view.summary, &discounts, config);
    if !view.payments.is_empty() {
        push_payments(&mut out, &view.payments, config);
        out.push(row("Balance due", &config.format_currency(view.summary.balance_due)));
    }
    for notice in &view.notices {
        out.push(format!("! {}", notice));
    }
    out.join("\n")
}

/// Printed receipt for a placed (or held) sale.
pub fn render_receipt(receipt: &SaleReceipt, config: &ConfigState) -> String {
    let request = &receipt.request;
    let mut out = Vec::new();

    out.push(centered(&receipt.store_name));
    out.push(row("Invoice", &receipt.sale.invoice_number));
    out.push(row(
        &receipt.placed_at.format("%Y-%m-%d %H:%M").to_string(),
        &format!("Cashier {}", config.operator),
    ));
    if let Some(customer) = &receipt.customer_name {
        out.push(row("Customer", customer));
    }
    out.push(rule());

    for line in &request.products {
        out.push(line.name.clone());
        out.push(row(
            &format!(
                "  {} x {}",
                line.quantity,
                config.format_currency(line.unit_price)
            ),
            &config.format_currency(line.total),
        ));
    }
    out.push(rule());

    let mut discounts = Vec::new();
    if let Some(coupon) = &request.coupon {
        discounts.push((format!("Coupon {}", coupon.code), coupon.discount));
    }
    if let Some(loyalty) = &request.loyalty {
        discounts.push((
            format!("Loyalty ({} pts)", loyalty.points_redeemed),
            loyalty.discount,
        ));
    }
    if let Some(card) = &request.gift_card {
        discounts.push((format!("Gift card {}", card.number), card.amount));
    }
    push_summary(&mut out, &request.billing_summary, &discounts, config);
    push_payments(&mut out, &request.payment_details, config);
    if request.billing_summary.change_due.is_positive() {
        out.push(row(
            "Change",
            &config.format_currency(request.billing_summary.change_due),
        ));
    }
    if request.billing_summary.balance_due.is_positive() {
        out.push(row(
            "Balance due",
            &config.format_currency(request.billing_summary.balance_due),
        ));
    }
    if request.points_earned > 0 {
        out.push(row("Points earned", &request.points_earned.to_string()));
    }
    if let Some(note) = &request.note {
        out.push(rule());
        out.push(note.clone());
    }
    out.join("\n")
}

pub fn render_products(hits: &[ProductHit], config: &ConfigState) -> String {
    if hits.is_empty() {
        return "No products found".to_string();
    }
    hits.iter()
        .map(|hit| row(&format!("{}  {}", hit.code, hit.name), &config.format_currency(hit.price)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stores(stores: &[Store], current: Option<&str>) -> String {
    stores
        .iter()
        .map(|s| {
            let marker = if Some(s.id.as_str()) == current { "*" } else { " " };
            format!("{} {}  {}", marker, s.id, s.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart};
    use crate::commands::checkout::place_order;
    use crate::commands::promotion::apply_coupon;
    use crate::testing::{session, stores};
    use chrono::Utc;

    #[test]
    fn test_row_fits_width() {
        let line = row("Subtotal", "$200.00");
        assert_eq!(line.chars().count(), RECEIPT_WIDTH);
        assert!(line.starts_with("Subtotal "));
        assert!(line.ends_with(" $200.00"));
    }

    #[test]
    fn test_row_wraps_long_text() {
        let long = "A very long product name that will not fit";
        let text = row(long, "$1.00");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].trim(), "$1.00");
    }

    #[tokio::test]
    async fn test_cart_view_shows_lines_and_coupon() {
        let (_backend, session) = session().await;
        let config = ConfigState::default();
        add_to_cart(&session, &config, "COLA-330", 2).await.unwrap();
        apply_coupon(&session, &config, "TENOFF", Utc::now())
            .await
            .unwrap();

        let text = render_cart(&get_cart(&session).await, &config);

        assert!(text.contains("1. Cola 330ml"));
        assert!(text.contains("2 x $100.00"));
        assert!(text.contains("Coupon TENOFF"));
        assert!(text.contains("-$20.00"));
        assert!(text.lines().any(|l| l.starts_with("TOTAL") && l.ends_with("$200.00")));
    }

    #[tokio::test]
    async fn test_empty_cart_view() {
        let (_backend, session) = session().await;
        let text = render_cart(&get_cart(&session).await, &ConfigState::default());
        assert!(text.contains("Cart is empty"));
        assert!(text.contains("walk-in"));
    }

    #[tokio::test]
    async fn test_receipt_contents() {
        let (_backend, session) = session().await;
        let config = ConfigState::default();
        add_to_cart(&session, &config, "COLA-330", 2).await.unwrap();
        apply_coupon(&session, &config, "TENOFF", Utc::now())
            .await
            .unwrap();
        let sale = place_order(
            &session,
            &config,
            Some(Money::from_cents(25_000)),
            None,
            Utc::now(),
        )
        .await
        .unwrap();

        let text = render_receipt(&sale, &config);

        assert!(text.contains("Main Street"));
        assert!(text.contains("INV-0001"));
        assert!(text.contains("Cola 330ml"));
        assert!(text.contains("Coupon TENOFF"));
        assert!(text.lines().any(|l| l.starts_with("Change") && l.ends_with("$50.00")));
        assert!(text.lines().any(|l| l.starts_with("Cash") && l.ends_with("$200.00")));
    }

    #[test]
    fn test_store_list_marks_current() {
        let text = render_stores(&stores(), Some("store-2"));
        assert!(text.contains("  store-1  Main Street"));
        assert!(text.contains("* store-2  Harbour"));
    }
}
