use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::Listing, traits::PromoGatewayError};

pub async fn fetch_listing(listing_id: i64, conn: &mut SqliteConnection) -> Result<Option<Listing>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM listings WHERE id = $1").bind(listing_id).fetch_optional(conn).await
}

/// Applies a timed boost. Re-applying with the same `until` is harmless, which is what makes the
/// settlement side-effect step safe to retry.
pub async fn apply_boost(
    listing_id: i64,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Listing, PromoGatewayError> {
    let row: Option<Listing> = sqlx::query_as(
        "UPDATE listings SET is_premium = 1, premium_until = $1, updated_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(until)
    .bind(Utc::now())
    .bind(listing_id)
    .fetch_optional(conn)
    .await?;
    let listing = row.ok_or(PromoGatewayError::ListingNotFound(listing_id))?;
    debug!("🗃️ Listing #{listing_id} boosted until {until}");
    Ok(listing)
}

/// Unconditionally clears the promotion fields. Used by the admin override.
pub async fn clear_premium(listing_id: i64, conn: &mut SqliteConnection) -> Result<Listing, PromoGatewayError> {
    let row: Option<Listing> = sqlx::query_as(
        "UPDATE listings SET is_premium = 0, premium_until = NULL, updated_at = $1 WHERE id = $2 RETURNING *",
    )
    .bind(Utc::now())
    .bind(listing_id)
    .fetch_optional(conn)
    .await?;
    row.ok_or(PromoGatewayError::ListingNotFound(listing_id))
}

/// The expiry sweep. Demotes exactly the rows matching the predicate at the instant of the update, so a
/// listing whose window was just renewed past `now` is left alone, and a second pass finds nothing to do.
pub async fn expire_overdue(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Listing>, PromoGatewayError> {
    let rows = sqlx::query_as(
        "UPDATE listings SET is_premium = 0, premium_until = NULL, updated_at = $1 WHERE is_premium = 1 AND \
         premium_until < $1 RETURNING *",
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
