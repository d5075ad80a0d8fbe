use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{TickerSlot, UserId},
    traits::PromoGatewayError,
};

/// The slot row is seeded by the schema migration and must always exist.
pub async fn fetch_slot(conn: &mut SqliteConnection) -> Result<TickerSlot, sqlx::Error> {
    sqlx::query_as("SELECT current_listing_id, owner_id, claimed_at FROM ticker_slot WHERE id = 1")
        .fetch_one(conn)
        .await
}

/// Full overwrite of the singleton row. Callers wrap this together with [`fetch_slot`] in one database
/// transaction so the previous occupant is read and replaced atomically.
pub async fn overwrite_slot(
    listing_id: i64,
    owner: &UserId,
    claimed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<TickerSlot, PromoGatewayError> {
    let slot = sqlx::query_as(
        "UPDATE ticker_slot SET current_listing_id = $1, owner_id = $2, claimed_at = $3 WHERE id = 1 RETURNING \
         current_listing_id, owner_id, claimed_at",
    )
    .bind(listing_id)
    .bind(owner)
    .bind(claimed_at)
    .fetch_one(conn)
    .await?;
    Ok(slot)
}
