#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use sea_orm::{ConnectOptions, Database};
use tower::ServiceExt;
use waybill_api::{
    app_router,
    config::AppConfig,
    db::{run_migrations, DbPool},
    AppState,
};

/// In-process application over an in-memory SQLite database.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<DbPool>,
}

pub async fn spawn_app() -> TestApp {
    // One pooled connection keeps every query on the same in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Arc::new(
        Database::connect(opt)
            .await
            .expect("failed to open in-memory sqlite"),
    );
    run_migrations(&db).await.expect("failed to run migrations");

    let config = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        0,
        "test".to_string(),
    );
    let state = AppState::new(db.clone(), config);

    TestApp {
        router: app_router(state),
        db,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str) -> Response {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get_with_cookie(&self, path: &str, cookie: &str) -> Response {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_form(&self, path: &str, pairs: &[(String, String)]) -> Response {
        let body = serde_urlencoded::to_string(pairs).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Registers a fresh user and returns the session cookie pair.
    pub async fn register_session(&self, username: &str) -> String {
        let response = self
            .post_form(
                "/register",
                &pairs(&[
                    ("username", username),
                    ("password1", "hunter2hunter2"),
                    ("password2", "hunter2hunter2"),
                ]),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response)
    }
}

/// Extracts the `name=value` pair of the session cookie from a response.
pub fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets no cookie")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .expect("malformed set-cookie header")
        .to_string()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

pub fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A complete order submission with two line items, keyed by order number.
pub fn sample_order_pairs(order_no: &str) -> Vec<(String, String)> {
    pairs(&[
        ("orderNo", order_no),
        ("senderName", "Alice"),
        ("senderPhone", "13800000001"),
        ("senderAddress", "1 Canal St"),
        ("productCode", "GEN"),
        ("receiverName", "Bob"),
        ("receiverPhone", "13800000002"),
        ("receiverAddress", "2 Harbor Rd"),
        ("totalFee", "65.5"),
        ("paymentMethod", "prepaid"),
        ("returnRequirement", "none"),
        ("otherExpenses", "0"),
        ("feeDescription", ""),
        ("carrier", "Fast Freight"),
        ("carrierAddress", "3 Depot Ln"),
        ("arrivalAddress", "2 Harbor Rd"),
        ("departureStationPhone", "010-1111"),
        ("arrivalStationPhone", "020-2222"),
        ("customerOrderNo", "C-77"),
        ("date", "2026-08-29"),
        ("departureStation", "North"),
        ("arrivalStation", "South"),
        ("transportMethod", "road"),
        ("deliveryMethod", "door"),
        ("senderSign", "A"),
        ("receiverSign", "B"),
        ("idCard", "110101"),
        ("orderMaker", "clerk"),
        ("items[0][productName]", "Box"),
        ("items[0][packageType]", "carton"),
        ("items[0][quantity]", "2"),
        ("items[0][weight]", "1.5"),
        ("items[0][volume]", "0.3"),
        ("items[0][freight]", "10.0"),
        ("items[1][productName]", "Crate"),
        ("items[1][packageType]", "wood"),
        ("items[1][quantity]", "1"),
        ("items[1][weight]", "20"),
        ("items[1][volume]", "2"),
        ("items[1][freight]", "55.5"),
        ("items[1][insuranceFee]", "3.25"),
    ])
}
