pub mod audit;
pub mod listings;
pub mod notifications;
pub mod packages;
pub mod ticker;
pub mod transactions;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new().max_connections(max_connections).connect(url).await
}

pub fn db_url() -> String {
    std::env::var("BPS_DATABASE_URL").unwrap_or_else(|_| "sqlite://data/boost_gateway.db".to_string())
}
