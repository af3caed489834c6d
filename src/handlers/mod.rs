pub mod auth;
pub mod orders;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{auth::AuthService, orders::OrderService},
};

/// Bundle of the application services shared across handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db_pool.clone())),
            auth: Arc::new(AuthService::new(db_pool, config.session_ttl_secs)),
        }
    }
}
