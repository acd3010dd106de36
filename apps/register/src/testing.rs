//! In-memory sales backend and session fixtures for register tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use meridian_client::{ClientError, ClientResult, SalesBackend};
use meridian_core::{
    Category, Coupon, CreateSaleRequest, Customer, DiscountRule, GiftCard, LoyaltyProgram, Money,
    Product, ProductVariant, SaleRecord, Store, TaxMode, TaxRate,
};

use crate::state::{ConfigState, SessionState};

#[derive(Default)]
pub struct MemoryBackend {
    pub sales: Mutex<Vec<CreateSaleRequest>>,
    /// When set, `create_sale` fails with this message.
    pub fail_sales_with: Mutex<Option<String>>,
    pub product_loads: AtomicUsize,
    /// Overrides Ada's loyalty balance on the next customer load.
    pub ada_points: Mutex<Option<i64>>,
}

impl MemoryBackend {
    pub fn sale_count(&self) -> usize {
        self.sales.lock().unwrap().len()
    }

    fn known_store(store_id: &str) -> ClientResult<()> {
        if stores().iter().any(|s| s.id == store_id) {
            Ok(())
        } else {
            Err(ClientError::Api {
                status: 404,
                message: format!("Unknown store {}", store_id),
            })
        }
    }
}

#[async_trait]
impl SalesBackend for MemoryBackend {
    async fn list_stores(&self) -> ClientResult<Vec<Store>> {
        Ok(stores())
    }

    async fn list_products(&self, store_id: &str) -> ClientResult<Vec<Product>> {
        Self::known_store(store_id)?;
        self.product_loads.fetch_add(1, Ordering::SeqCst);
        Ok(products())
    }

    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        Ok(vec![Category {
            id: "drinks".into(),
            name: "Drinks".into(),
        }])
    }

    async fn list_customers(&self) -> ClientResult<Vec<Customer>> {
        Ok(vec![Customer {
            id: "c-ada".into(),
            name: "Ada Lovelace".into(),
            phone: Some("555-0100".into()),
            email: None,
            loyalty_points: self.ada_points.lock().unwrap().unwrap_or(500),
        }])
    }

    /// Store-1 runs TENOFF and an expired OLDDEAL; store-2 runs no coupons.
    async fn active_coupons(&self, store_id: &str) -> ClientResult<Vec<Coupon>> {
        Self::known_store(store_id)?;
        if store_id != "store-1" {
            return Ok(Vec::new());
        }
        Ok(vec![
            Coupon {
                code: "TENOFF".into(),
                rule: DiscountRule::Percentage { bps: 1000 },
                min_purchase: None,
                max_discount: None,
                starts_at: None,
                expires_at: None,
                is_active: true,
            },
            Coupon {
                code: "OLDDEAL".into(),
                rule: DiscountRule::Fixed {
                    amount: Money::from_cents(500),
                },
                min_purchase: None,
                max_discount: None,
                starts_at: None,
                expires_at: Some(Utc::now() - Duration::days(1)),
                is_active: true,
            },
        ])
    }

    async fn list_gift_cards(&self) -> ClientResult<Vec<GiftCard>> {
        Ok(vec![GiftCard {
            number: "GC-1000".into(),
            balance: Money::from_cents(5_000),
            expires_at: None,
            is_active: true,
        }])
    }

    async fn loyalty_settings(&self) -> ClientResult<LoyaltyProgram> {
        Ok(LoyaltyProgram {
            enabled: true,
            cents_per_point: 10,
            min_redeem_points: 10,
            spend_per_point_cents: 1_000,
        })
    }

    async fn create_sale(&self, request: &CreateSaleRequest) -> ClientResult<SaleRecord> {
        if let Some(message) = self.fail_sales_with.lock().unwrap().clone() {
            return Err(ClientError::Api {
                status: 422,
                message,
            });
        }
        let mut sales = self.sales.lock().unwrap();
        sales.push(request.clone());
        Ok(SaleRecord {
            id: format!("sale-{}", sales.len()),
            invoice_number: format!("INV-{:04}", sales.len()),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn stores() -> Vec<Store> {
    vec![
        Store {
            id: "store-1".into(),
            name: "Main Street".into(),
            address: Some("1 Main Street".into()),
            phone: None,
            is_active: true,
        },
        Store {
            id: "store-2".into(),
            name: "Harbour".into(),
            address: None,
            phone: None,
            is_active: true,
        },
    ]
}

pub fn products() -> Vec<Product> {
    vec![
        Product {
            id: "p-cola".into(),
            sku: "COLA-330".into(),
            barcode: Some("5449000000996".into()),
            name: "Cola 330ml".into(),
            category_id: Some("drinks".into()),
            price: Money::from_cents(10_000),
            tax_rate: TaxRate::from_bps(1000),
            tax_mode: TaxMode::Exclusive,
            discount: None,
            variants: vec![],
            is_active: true,
        },
        Product {
            id: "p-shirt".into(),
            sku: "SHIRT".into(),
            barcode: None,
            name: "Shirt".into(),
            category_id: None,
            price: Money::from_cents(2_500),
            tax_rate: TaxRate::zero(),
            tax_mode: TaxMode::Exclusive,
            discount: None,
            variants: vec![ProductVariant {
                id: "v-shirt-l".into(),
                name: "Large".into(),
                sku: "SHIRT-L".into(),
                price: Money::from_cents(2_700),
            }],
            is_active: true,
        },
    ]
}

pub async fn session_with(backend: Arc<MemoryBackend>) -> SessionState {
    SessionState::start(
        backend,
        "store-1",
        Duration::minutes(5),
        ConfigState::default().pricing(),
        Utc::now(),
    )
    .await
    .unwrap()
}

pub async fn session() -> (Arc<MemoryBackend>, SessionState) {
    let backend = Arc::new(MemoryBackend::default());
    let session = session_with(backend.clone()).await;
    (backend, session)
}

pub fn manager() -> ConfigState {
    ConfigState {
        role: meridian_core::Role::Manager,
        operator: "Grace".into(),
        ..ConfigState::default()
    }
}
