use bps_common::Cfa;

use crate::{
    db_types::{ListingStatus, UserId},
    SqliteDatabase,
};

/// Inserts a listing and returns its id.
pub async fn seed_listing(db: &SqliteDatabase, seller: &str, title: &str, status: ListingStatus) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO listings (seller_id, title, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(UserId::from(seller))
    .bind(title)
    .bind(status.to_string())
    .fetch_one(db.pool())
    .await
    .expect("Error seeding listing");
    row.0
}

/// Inserts a package alongside the defaults from the catalog seed and returns its id.
pub async fn seed_package(db: &SqliteDatabase, name: &str, price: Cfa, duration_days: i64, active: bool) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO packages (name, price, duration_days, active) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(name)
    .bind(price)
    .bind(duration_days)
    .bind(active)
    .fetch_one(db.pool())
    .await
    .expect("Error seeding package");
    row.0
}
