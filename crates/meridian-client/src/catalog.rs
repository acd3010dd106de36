//! # Reference Data
//!
//! Stores, products, customers and promotion lists fetched once per store
//! context and consulted by the register while building an order.
//!
//! ## Loading
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ReferenceData::load(backend, "store-1", ttl, now)                      │
//! │       │                                                                 │
//! │       ├── stores ─────┐                                                 │
//! │       ├── products ───┤                                                 │
//! │       ├── categories ─┤                                                 │
//! │       ├── customers ──┼── try_join! (first error wins)                  │
//! │       ├── coupons ────┤                                                 │
//! │       ├── gift cards ─┤                                                 │
//! │       └── loyalty ────┘                                                 │
//! │                                                                         │
//! │  fetched_at + ttl ──► is_stale(now) ──► register reloads                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use meridian_core::validation::validate_search_query;
use meridian_core::{Category, Coupon, Customer, GiftCard, LoyaltyProgram, Product, Store};

use crate::backend::SalesBackend;
use crate::error::ClientResult;

#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub store_id: String,
    pub stores: Vec<Store>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub customers: Vec<Customer>,
    pub coupons: Vec<Coupon>,
    pub gift_cards: Vec<GiftCard>,
    pub loyalty: LoyaltyProgram,
    pub fetched_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl ReferenceData {
    /// Fetches everything for `store_id` concurrently.
    pub async fn load(
        backend: &dyn SalesBackend,
        store_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> ClientResult<Self> {
        let (stores, products, categories, customers, coupons, gift_cards, loyalty) = tokio::try_join!(
            backend.list_stores(),
            backend.list_products(store_id),
            backend.list_categories(),
            backend.list_customers(),
            backend.active_coupons(store_id),
            backend.list_gift_cards(),
            backend.loyalty_settings(),
        )?;

        info!(
            store_id,
            products = products.len(),
            customers = customers.len(),
            coupons = coupons.len(),
            "Reference data loaded"
        );

        Ok(ReferenceData {
            store_id: store_id.to_string(),
            stores,
            products,
            categories,
            customers,
            coupons,
            gift_cards,
            loyalty,
            fetched_at: now,
            ttl,
        })
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at >= self.ttl
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn store(&self, id: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == id)
    }

    /// The store this data was loaded for.
    pub fn current_store(&self) -> Option<&Store> {
        self.store(&self.store_id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Finds an active product by SKU or barcode, ignoring case.
    pub fn product_by_code(&self, code: &str) -> Option<&Product> {
        let code = code.trim();
        self.products
            .iter()
            .find(|p| p.is_active && p.matches_code(code))
    }

    /// Active products whose name contains `query` (case-insensitive).
    /// An empty query returns every active product.
    pub fn search_products(&self, query: &str) -> Vec<&Product> {
        let Ok(query) = validate_search_query(query) else {
            return Vec::new();
        };
        let query = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.is_active && p.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn products_in_category(&self, category_id: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.is_active && p.category_id.as_deref() == Some(category_id))
            .collect()
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn customer_by_phone(&self, phone: &str) -> Option<&Customer> {
        let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
        let wanted = digits(phone);
        if wanted.is_empty() {
            return None;
        }
        self.customers
            .iter()
            .find(|c| c.phone.as_deref().is_some_and(|p| digits(p) == wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::http::HttpBackend;
    use crate::testing::TestServer;

    async fn loaded(now: DateTime<Utc>) -> (TestServer, ReferenceData) {
        let server = TestServer::spawn().await;
        let backend = HttpBackend::new(&server.config()).unwrap();
        let data = ReferenceData::load(&backend, "store-1", Duration::minutes(5), now)
            .await
            .unwrap();
        (server, data)
    }

    #[tokio::test]
    async fn test_load_fetches_everything() {
        let (server, data) = loaded(Utc::now()).await;

        assert_eq!(data.stores.len(), 2);
        assert_eq!(data.products.len(), 2);
        assert_eq!(data.coupons[0].code, "TENOFF");
        assert_eq!(data.gift_cards[0].number, "GC-1000");
        assert!(data.loyalty.enabled);
        assert_eq!(data.current_store().unwrap().name, "Main Street");
        assert_eq!(
            server
                .state
                .reference_requests
                .load(std::sync::atomic::Ordering::SeqCst),
            7
        );
    }

    #[tokio::test]
    async fn test_load_fails_fast_on_any_error() {
        let server = TestServer::spawn().await;
        let backend = HttpBackend::new(&server.config()).unwrap();

        let err = ReferenceData::load(&backend, "unknown", Duration::minutes(5), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_staleness() {
        let now = Utc::now();
        let (_server, data) = loaded(now).await;

        assert!(!data.is_stale(now + Duration::minutes(4)));
        assert!(data.is_stale(now + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_lookups() {
        let (_server, data) = loaded(Utc::now()).await;

        assert_eq!(data.product_by_code("cola-330").unwrap().id, "p-cola");
        assert_eq!(data.product_by_code("5449000000996").unwrap().id, "p-cola");
        assert!(data.product_by_code("UNKNOWN").is_none());

        assert_eq!(data.search_products("bread").len(), 1);
        assert_eq!(data.search_products("").len(), 2);
        assert_eq!(data.products_in_category("drinks")[0].sku, "COLA-330");

        assert_eq!(data.customer_by_phone("(555) 0100").unwrap().id, "c-ada");
        assert!(data.customer_by_phone("").is_none());
        assert!(data.customer("c-ada").is_some());
    }
}
