//! # Register Commands
//!
//! Everything the operator can type at the prompt.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (parsing and dispatch)
//! ├── cart.rs       ◄─── Lines, line discounts, store, customer
//! ├── promotion.rs  ◄─── Coupon, gift card, loyalty
//! ├── checkout.rs   ◄─── Tenders, place, hold
//! └── catalog.rs    ◄─── Search, browse, refresh
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  "coupon TENOFF"                                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Command::parse ──────► Command::Coupon(Some("TENOFF"))                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  execute(session, config, command, now)                                 │
//! │         │                                                               │
//! │         ├── promotion::apply_coupon → CartView                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  receipt::render_cart ──► printed on stdout                             │
//! │                                                                         │
//! │  Errors come back as ApiError and are printed; the session goes on.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod promotion;

use chrono::{DateTime, Utc};
use tracing::warn;

use meridian_core::{DiscountRule, Money, PaymentMethod};

use crate::error::ApiError;
use crate::receipt;
use crate::state::{ConfigState, SessionState};

pub const HELP: &str = "\
Commands:
  add <code> [qty]            add a product by SKU, barcode or variant SKU
  qty <line> <qty>            set a line's quantity (0 removes it)
  remove <line>               remove a line
  discount <line> <10%|1.50|none>
                              override a line discount (manager and above)
  clear                       empty the order (store and customer stay)
  customer <id|phone|none>    select or deselect the customer
  store <id>                  switch store and reload its catalog
  stores                      list stores
  coupon <code|remove>        apply or remove a coupon
  giftcard <number|remove>    apply or remove a gift card
  loyalty <points|remove>     redeem or drop loyalty points
  pay <method> <amount> [ref] record a card/mobile/other/cash tender
  pay clear                   drop recorded tenders
  place [cash <amount>] [note <text>]
                              place the order
  hold [note <text>]          park the order as a draft
  show [json]                 show the order
  search [query]              search products by name
  browse <category>           list a category
  refresh                     reload reference data
  help                        this text
  quit                        leave the register";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { code: String, quantity: i64 },
    Quantity { line: usize, quantity: i64 },
    Remove { line: usize },
    Discount { line: usize, rule: Option<DiscountRule> },
    Clear,
    Customer(Option<String>),
    Store(String),
    Stores,
    /// `None` removes the coupon
    Coupon(Option<String>),
    GiftCard(Option<String>),
    Loyalty(Option<i64>),
    Pay {
        method: PaymentMethod,
        amount: Money,
        reference: Option<String>,
    },
    ClearPayments,
    Place { cash: Option<Money>, note: Option<String> },
    Hold { note: Option<String> },
    Show { json: bool },
    Search(String),
    Browse(String),
    Refresh,
    Help,
    Quit,
}

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Print(String),
    Quit,
}

// =============================================================================
// Parsing
// =============================================================================

fn usage(text: &str) -> ApiError {
    ApiError::validation(format!("usage: {}", text))
}

fn parse_line(arg: Option<&str>, text: &str) -> Result<usize, ApiError> {
    arg.and_then(|a| a.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| usage(text))
}

fn parse_quantity(arg: &str) -> Result<i64, ApiError> {
    arg.parse::<i64>()
        .map_err(|_| ApiError::validation(format!("'{}' is not a quantity", arg)))
}

fn parse_money(config: &ConfigState, arg: &str) -> Result<Money, ApiError> {
    config
        .parse_amount(arg)
        .ok_or_else(|| ApiError::validation(format!("'{}' is not an amount", arg)))
}

/// "12.5%" → 1250 basis points.
fn parse_percent(arg: &str) -> Option<u32> {
    let number = arg.strip_suffix('%')?.trim();
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if frac.len() > 2 || (whole.is_empty() && frac.is_empty()) {
        return None;
    }
    let whole: u32 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: u32 = if frac.is_empty() {
        0
    } else {
        format!("{:0<2}", frac).parse().ok()?
    };
    whole.checked_mul(100)?.checked_add(frac)
}

fn parse_discount(config: &ConfigState, arg: &str) -> Result<Option<DiscountRule>, ApiError> {
    if arg.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if arg.ends_with('%') {
        let bps = parse_percent(arg)
            .ok_or_else(|| ApiError::validation(format!("'{}' is not a percentage", arg)))?;
        return Ok(Some(DiscountRule::Percentage { bps }));
    }
    Ok(Some(DiscountRule::Fixed {
        amount: parse_money(config, arg)?,
    }))
}

/// Splits `cash <amount>` and `note <text...>` options off a place/hold line.
fn parse_place_options(
    config: &ConfigState,
    rest: &[&str],
    allow_cash: bool,
) -> Result<(Option<Money>, Option<String>), ApiError> {
    let mut cash = None;
    let mut note = None;
    let mut i = 0;
    while i < rest.len() {
        match rest[i].to_lowercase().as_str() {
            "cash" if allow_cash => {
                let amount = rest.get(i + 1).ok_or_else(|| usage("place cash <amount>"))?;
                cash = Some(parse_money(config, amount)?);
                i += 2;
            }
            "note" => {
                let text = rest[i + 1..].join(" ");
                if text.is_empty() {
                    return Err(usage("note <text>"));
                }
                note = Some(text);
                break;
            }
            other => return Err(ApiError::validation(format!("unexpected '{}'", other))),
        }
    }
    Ok((cash, note))
}

impl Command {
    /// Parses one input line. Amounts use the configured currency decimals.
    pub fn parse(line: &str, config: &ConfigState) -> Result<Command, ApiError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((head, rest)) = words.split_first() else {
            return Err(usage("help"));
        };
        let first = rest.first().copied();
        let is_remove = first.is_some_and(|w| w.eq_ignore_ascii_case("remove"));

        let command = match head.to_lowercase().as_str() {
            "add" => {
                let code = first.ok_or_else(|| usage("add <code> [qty]"))?;
                let quantity = match rest.get(1) {
                    Some(q) => parse_quantity(q)?,
                    None => 1,
                };
                Command::Add {
                    code: code.to_string(),
                    quantity,
                }
            }
            "qty" => {
                let line = parse_line(first, "qty <line> <qty>")?;
                let quantity = rest
                    .get(1)
                    .ok_or_else(|| usage("qty <line> <qty>"))
                    .and_then(|q| parse_quantity(q))?;
                Command::Quantity { line, quantity }
            }
            "remove" | "rm" => Command::Remove {
                line: parse_line(first, "remove <line>")?,
            },
            "discount" => {
                let line = parse_line(first, "discount <line> <10%|1.50|none>")?;
                let arg = rest
                    .get(1)
                    .ok_or_else(|| usage("discount <line> <10%|1.50|none>"))?;
                Command::Discount {
                    line,
                    rule: parse_discount(config, arg)?,
                }
            }
            "clear" => Command::Clear,
            "customer" => match first {
                None => return Err(usage("customer <id|phone|none>")),
                Some(w) if w.eq_ignore_ascii_case("none") => Command::Customer(None),
                Some(_) => Command::Customer(Some(rest.join(" "))),
            },
            "store" => Command::Store(first.ok_or_else(|| usage("store <id>"))?.to_string()),
            "stores" => Command::Stores,
            "coupon" => match first {
                None => return Err(usage("coupon <code|remove>")),
                Some(_) if is_remove => Command::Coupon(None),
                Some(code) => Command::Coupon(Some(code.to_string())),
            },
            "giftcard" | "gc" => match first {
                None => return Err(usage("giftcard <number|remove>")),
                Some(_) if is_remove => Command::GiftCard(None),
                Some(number) => Command::GiftCard(Some(number.to_string())),
            },
            "loyalty" => match first {
                None => return Err(usage("loyalty <points|remove>")),
                Some(_) if is_remove => Command::Loyalty(None),
                Some(points) => Command::Loyalty(Some(parse_quantity(points)?)),
            },
            "pay" => match first {
                Some(w) if w.eq_ignore_ascii_case("clear") => Command::ClearPayments,
                Some(method) => {
                    let method: PaymentMethod = method.parse().map_err(ApiError::validation)?;
                    let amount = rest
                        .get(1)
                        .ok_or_else(|| usage("pay <method> <amount> [ref]"))?;
                    Command::Pay {
                        method,
                        amount: parse_money(config, amount)?,
                        reference: rest.get(2).map(|r| r.to_string()),
                    }
                }
                None => return Err(usage("pay <method> <amount> [ref]")),
            },
            "place" => {
                let (cash, note) = parse_place_options(config, rest, true)?;
                Command::Place { cash, note }
            }
            "hold" => {
                let (_, note) = parse_place_options(config, rest, false)?;
                Command::Hold { note }
            }
            "show" | "cart" => Command::Show {
                json: first.is_some_and(|w| w.eq_ignore_ascii_case("json")),
            },
            "search" => Command::Search(rest.join(" ")),
            "browse" => Command::Browse(first.ok_or_else(|| usage("browse <category>"))?.to_string()),
            "refresh" => Command::Refresh,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(ApiError::validation(format!(
                    "unknown command '{}', type 'help'",
                    other
                )))
            }
        };
        Ok(command)
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Reloads stale reference data before a checkout-type command. A failed
/// reload is logged and the cached data is used; the backend validates the
/// sale again on submit.
pub(crate) async fn ensure_fresh(session: &SessionState, now: DateTime<Utc>) {
    if let Err(e) = session.refresh_if_stale(now).await {
        warn!(error = %e, "Could not refresh reference data, using cached copy");
    }
}

pub async fn execute(
    session: &SessionState,
    config: &ConfigState,
    command: Command,
    now: DateTime<Utc>,
) -> Result<Outcome, ApiError> {
    let view = match command {
        Command::Add { code, quantity } => cart::add_to_cart(session, config, &code, quantity).await?,
        Command::Quantity { line, quantity } => {
            cart::update_cart_item(session, config, line, quantity).await?
        }
        Command::Remove { line } => cart::remove_from_cart(session, config, line).await?,
        Command::Discount { line, rule } => {
            cart::set_line_discount(session, config, line, rule).await?
        }
        Command::Clear => cart::clear_cart(session, config).await?,
        Command::Customer(query) => {
            cart::select_customer(session, config, query.as_deref()).await?
        }
        Command::Store(id) => cart::select_store(session, config, &id, now).await?,
        Command::Coupon(Some(code)) => promotion::apply_coupon(session, config, &code, now).await?,
        Command::Coupon(None) => promotion::remove_coupon(session, config).await?,
        Command::GiftCard(Some(number)) => {
            promotion::apply_gift_card(session, config, &number, now).await?
        }
        Command::GiftCard(None) => promotion::remove_gift_card(session, config).await?,
        Command::Loyalty(Some(points)) => {
            promotion::apply_loyalty(session, config, points, now).await?
        }
        Command::Loyalty(None) => promotion::remove_loyalty(session, config).await?,
        Command::Pay {
            method,
            amount,
            reference,
        } => checkout::add_payment(session, config, method, amount, reference).await?,
        Command::ClearPayments => checkout::clear_payments(session, config).await?,
        Command::Show { json: true } => {
            let view = cart::get_cart(session).await;
            let text = serde_json::to_string_pretty(&view)
                .map_err(|e| ApiError::internal(e.to_string()))?;
            return Ok(Outcome::Print(text));
        }
        Command::Show { json: false } => cart::get_cart(session).await,
        Command::Place { cash, note } => {
            let sale = checkout::place_order(session, config, cash, note, now).await?;
            return Ok(Outcome::Print(receipt::render_receipt(&sale, config)));
        }
        Command::Hold { note } => {
            let sale = checkout::hold_order(session, config, note, now).await?;
            return Ok(Outcome::Print(format!(
                "Order held as {}",
                sale.sale.invoice_number
            )));
        }
        Command::Stores => {
            let stores = catalog::list_stores(session).await;
            let current = session.order().await.store().map(|s| s.id.clone());
            return Ok(Outcome::Print(receipt::render_stores(&stores, current.as_deref())));
        }
        Command::Search(query) => {
            let hits = catalog::search_products(session, &query).await;
            return Ok(Outcome::Print(receipt::render_products(&hits, config)));
        }
        Command::Browse(category) => {
            let hits = catalog::browse_category(session, &category).await?;
            return Ok(Outcome::Print(receipt::render_products(&hits, config)));
        }
        Command::Refresh => {
            let reloaded = catalog::refresh_reference(session, now).await?;
            let mut text = format!("Reloaded {} products", reloaded.products);
            for notice in &reloaded.notices {
                text.push('\n');
                text.push_str(notice);
            }
            return Ok(Outcome::Print(text));
        }
        Command::Help => return Ok(Outcome::Print(HELP.to_string())),
        Command::Quit => return Ok(Outcome::Quit),
    };

    Ok(Outcome::Print(receipt::render_cart(&view, config)))
}
