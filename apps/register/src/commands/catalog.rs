//! # Catalog Commands
//!
//! Read-only lookups against the loaded reference data, plus an explicit
//! reload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use meridian_core::{Money, Product, Store};

use crate::commands::cart::dropped_notice;
use crate::error::ApiError;
use crate::state::SessionState;

/// Product search hit, flattened so variants show up as their own rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    /// Code to type after `add`
    pub code: String,
    pub name: String,
    pub price: Money,
}

fn hits(product: &Product) -> Vec<ProductHit> {
    if product.variants.is_empty() {
        return vec![ProductHit {
            code: product.sku.clone(),
            name: product.name.clone(),
            price: product.price,
        }];
    }
    product
        .variants
        .iter()
        .map(|v| ProductHit {
            code: v.sku.clone(),
            name: format!("{} ({})", product.name, v.name),
            price: v.price,
        })
        .collect()
}

/// Searches active products by name. An empty query lists everything.
pub async fn search_products(session: &SessionState, query: &str) -> Vec<ProductHit> {
    debug!(query, "search_products command");
    let reference = session.reference().await;
    reference
        .search_products(query)
        .into_iter()
        .flat_map(hits)
        .collect()
}

/// Active products in one category.
pub async fn browse_category(
    session: &SessionState,
    category: &str,
) -> Result<Vec<ProductHit>, ApiError> {
    debug!(category, "browse_category command");
    let reference = session.reference().await;
    let category_id = reference
        .categories
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(category) || c.name.eq_ignore_ascii_case(category))
        .map(|c| c.id.clone())
        .ok_or_else(|| ApiError::not_found("Category", category))?;

    Ok(reference
        .products_in_category(&category_id)
        .into_iter()
        .flat_map(hits)
        .collect())
}

pub async fn list_stores(session: &SessionState) -> Vec<Store> {
    let reference = session.reference().await;
    reference
        .stores
        .iter()
        .filter(|s| s.is_active)
        .cloned()
        .collect()
}

/// Result of a manual reload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reloaded {
    pub products: usize,
    /// Promotions the fresh data no longer supports, already removed.
    pub notices: Vec<String>,
}

/// Reloads products, customers and promotions for the current store.
pub async fn refresh_reference(
    session: &SessionState,
    now: DateTime<Utc>,
) -> Result<Reloaded, ApiError> {
    debug!("refresh_reference command");
    let dropped = session.refresh(None, now).await?;
    let products = session.reference().await.products.len();
    info!(products, dropped = dropped.len(), "Reference data refreshed");
    Ok(Reloaded {
        products,
        notices: dropped.iter().map(dropped_notice).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, select_customer};
    use crate::commands::promotion::apply_loyalty;
    use crate::state::ConfigState;
    use crate::testing::session;

    #[tokio::test]
    async fn test_search_flattens_variants() {
        let (_backend, session) = session().await;

        let all = search_products(&session, "").await;
        let codes: Vec<_> = all.iter().map(|h| h.code.as_str()).collect();
        assert_eq!(codes, vec!["COLA-330", "SHIRT-L"]);
        assert_eq!(all[1].name, "Shirt (Large)");

        assert_eq!(search_products(&session, "cola").await.len(), 1);
        assert!(search_products(&session, "tea").await.is_empty());
    }

    #[tokio::test]
    async fn test_browse_category_by_name() {
        let (_backend, session) = session().await;
        let hits = browse_category(&session, "drinks").await.unwrap();
        assert_eq!(hits[0].code, "COLA-330");
        assert!(browse_category(&session, "toys").await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_reloads() {
        let (backend, session) = session().await;
        let reloaded = refresh_reference(&session, Utc::now()).await.unwrap();
        assert_eq!(reloaded.products, 2);
        assert!(reloaded.notices.is_empty());
        assert_eq!(
            backend.product_loads.load(std::sync::atomic::Ordering::SeqCst),
            2
        );
        assert_eq!(list_stores(&session).await.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_updates_customer_balance() {
        let (backend, session) = session().await;
        let config = ConfigState::default();
        let now = Utc::now();
        add_to_cart(&session, &config, "COLA-330", 1).await.unwrap();
        select_customer(&session, &config, Some("c-ada")).await.unwrap();
        apply_loyalty(&session, &config, 300, now).await.unwrap();

        *backend.ada_points.lock().unwrap() = Some(100);
        let reloaded = refresh_reference(&session, now).await.unwrap();

        assert_eq!(
            reloaded.notices,
            vec!["Removed from order: Insufficient loyalty points: requested 300, available 100"
                .to_string()]
        );
        let order = session.order().await;
        assert_eq!(order.customer().unwrap().loyalty_points, 100);
        assert_eq!(order.promotions().loyalty_points(), None);
        assert!(order.summary().loyalty_discount.is_zero());
    }
}
