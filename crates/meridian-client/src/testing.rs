//! In-process fake sales backend for tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use meridian_core::{
    Category, Coupon, Customer, DiscountRule, GiftCard, LoyaltyProgram, Money, Product, SaleRecord,
    Store, TaxMode, TaxRate,
};

use crate::backend::ApiEnvelope;
use crate::config::BackendConfig;

pub const TEST_TOKEN: &str = "test-token";

#[derive(Default)]
pub struct FakeState {
    /// Bodies received on `POST /sales`.
    pub sales: Mutex<Vec<serde_json::Value>>,
    /// When set, `POST /sales` fails with this status and message.
    pub fail_sales_with: Mutex<Option<(u16, String)>>,
    pub sale_delay_ms: AtomicU64,
    pub reference_requests: AtomicUsize,
}

impl FakeState {
    pub fn sale_count(&self) -> usize {
        self.sales.lock().unwrap().len()
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: Arc<FakeState>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/api/stores", get(stores))
            .route("/api/stores/{store}/products", get(products))
            .route("/api/stores/{store}/coupons/active", get(coupons))
            .route("/api/categories", get(categories))
            .route("/api/customers", get(customers))
            .route("/api/gift-cards", get(gift_cards))
            .route("/api/loyalty/settings", get(loyalty))
            .route("/api/sales", post(create_sale))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base_url,
            state,
            handle,
        }
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url.clone(),
            api_token: Some(TEST_TOKEN.to_string()),
            store_id: Some("store-1".to_string()),
            timeout_secs: 5,
            reference_ttl_secs: 300,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn sample_stores() -> Vec<Store> {
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

pub fn sample_products() -> Vec<Product> {
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
            id: "p-bread".into(),
            sku: "BREAD-WHITE".into(),
            barcode: None,
            name: "White Bread".into(),
            category_id: Some("bakery".into()),
            price: Money::from_cents(350),
            tax_rate: TaxRate::zero(),
            tax_mode: TaxMode::Inclusive,
            discount: Some(DiscountRule::Percentage { bps: 1000 }),
            variants: vec![],
            is_active: true,
        },
    ]
}

pub fn sample_customers() -> Vec<Customer> {
    vec![Customer {
        id: "c-ada".into(),
        name: "Ada Lovelace".into(),
        phone: Some("555-0100".into()),
        email: None,
        loyalty_points: 500,
    }]
}

pub fn sample_coupons() -> Vec<Coupon> {
    vec![Coupon {
        code: "TENOFF".into(),
        rule: DiscountRule::Percentage { bps: 1000 },
        min_purchase: None,
        max_discount: None,
        starts_at: None,
        expires_at: None,
        is_active: true,
    }]
}

pub fn sample_gift_cards() -> Vec<GiftCard> {
    vec![GiftCard {
        number: "GC-1000".into(),
        balance: Money::from_cents(5_000),
        expires_at: None,
        is_active: true,
    }]
}

pub fn sample_loyalty() -> LoyaltyProgram {
    LoyaltyProgram {
        enabled: true,
        cents_per_point: 10,
        min_redeem_points: 10,
        spend_per_point_cents: 1_000,
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TEST_TOKEN))
}

fn reply<T: Serialize>(state: &FakeState, headers: &HeaderMap, data: T) -> Response {
    state.reference_requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiEnvelope::<()>::failure("Missing or invalid API token")),
        )
            .into_response();
    }
    Json(ApiEnvelope::ok(data)).into_response()
}

async fn stores(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    reply(&state, &headers, sample_stores())
}

async fn products(
    State(state): State<Arc<FakeState>>,
    Path(store): Path<String>,
    headers: HeaderMap,
) -> Response {
    if store != "store-1" {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiEnvelope::<()>::failure(format!("Unknown store {}", store))),
        )
            .into_response();
    }
    reply(&state, &headers, sample_products())
}

async fn coupons(
    State(state): State<Arc<FakeState>>,
    Path(_store): Path<String>,
    headers: HeaderMap,
) -> Response {
    reply(&state, &headers, sample_coupons())
}

async fn categories(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let data = vec![
        Category {
            id: "drinks".into(),
            name: "Drinks".into(),
        },
        Category {
            id: "bakery".into(),
            name: "Bakery".into(),
        },
    ];
    reply(&state, &headers, data)
}

async fn customers(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    reply(&state, &headers, sample_customers())
}

async fn gift_cards(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    reply(&state, &headers, sample_gift_cards())
}

async fn loyalty(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    reply(&state, &headers, sample_loyalty())
}

async fn create_sale(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let delay = state.sale_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let failure = state.fail_sales_with.lock().unwrap().clone();
    if let Some((status, message)) = failure {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "success": false, "message": message }))).into_response();
    }

    let mut sales = state.sales.lock().unwrap();
    sales.push(body);
    let record = SaleRecord {
        id: format!("sale-{}", sales.len()),
        invoice_number: format!("INV-{:04}", sales.len()),
    };
    (StatusCode::CREATED, Json(ApiEnvelope::ok(record))).into_response()
}
