use sqlx::SqliteConnection;

use crate::db_types::Package;

pub async fn fetch_package(package_id: i64, conn: &mut SqliteConnection) -> Result<Option<Package>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM packages WHERE id = $1").bind(package_id).fetch_optional(conn).await
}

pub async fn fetch_active_packages(conn: &mut SqliteConnection) -> Result<Vec<Package>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM packages WHERE active = 1 ORDER BY duration_days, price").fetch_all(conn).await
}

/// There should be at most one of these; if an operator misconfigures several, the cheapest wins.
pub async fn fetch_ticker_package(conn: &mut SqliteConnection) -> Result<Option<Package>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM packages WHERE active = 1 AND duration_days = 0 ORDER BY price LIMIT 1")
        .fetch_optional(conn)
        .await
}
