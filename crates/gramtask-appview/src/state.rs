use std::sync::Arc;

use chrono::{DateTime, Utc};
use instagram_client::InstagramResolver;
use sqlx::postgres::PgPool;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub instagram: Arc<InstagramResolver>,
    pub reward_coins: i64,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(pool: PgPool, instagram: Arc<InstagramResolver>, reward_coins: i64) -> Self {
        Self {
            pool,
            instagram,
            reward_coins,
            started_at: Utc::now(),
        }
    }
}
