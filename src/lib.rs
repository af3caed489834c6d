pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod migrator;
pub mod services;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware as axum_middleware,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::{config::AppConfig, db::DbPool, handlers::AppServices};

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let services = AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Builds the application router.
///
/// `/orders/history` is the only session-gated route; the gate is attached
/// per route so the protected surface is explicit here rather than hidden in
/// handler bodies.
pub fn app_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/orders/history", get(handlers::orders::order_history))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/orders/create", post(handlers::orders::create_order))
        .route("/orders/:id", get(handlers::orders::get_order_detail))
        .route(
            "/orders/:id/edit",
            get(handlers::orders::edit_order_form).post(handlers::orders::edit_order),
        )
        .route("/orders/:id/delete", post(handlers::orders::delete_order))
        .merge(gated)
        .route(
            "/login",
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route(
            "/register",
            get(handlers::auth::register_page).post(handlers::auth::register),
        )
        .route("/logout", post(handlers::auth::logout))
        .layer(axum_middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

/// GET /
async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "waybill-api",
        "status": "running",
    }))
}

/// GET /health
///
/// Reports liveness plus database reachability.
async fn health_check(State(state): State<AppState>) -> Response {
    match state.db.ping().await {
        Ok(()) => Json(json!({ "status": "ok", "database": "reachable" })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "health check failed to reach database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
                .into_response()
        }
    }
}

/// Logs one line per request with method, path, status, and latency.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %uri,
        status = %response.status(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}
