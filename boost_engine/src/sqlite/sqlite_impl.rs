//! `SqliteDatabase` is a concrete implementation of a promotion gateway backend.
//!
//! It implements the [`PromoGatewayDatabase`] and [`CatalogManagement`] traits over a single connection
//! pool. Flows that must be atomic (ticker reassignment, the admin override) run inside one database
//! transaction; single-statement conditional updates are atomic on their own.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use super::db::{audit, listings, new_pool, notifications, packages, ticker, transactions};
use crate::{
    db_types::{Listing, NewTransaction, Notification, Package, TickerSlot, Transaction, TxStatus, UserId},
    traits::{CatalogApiError, CatalogManagement, FinalizeResult, PromoGatewayDatabase, PromoGatewayError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// An isolated in-memory database. SQLite keeps a separate in-memory database per connection, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn new_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { url: "sqlite::memory:".to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_active_packages(&self) -> Result<Vec<Package>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(packages::fetch_active_packages(&mut conn).await?)
    }

    async fn fetch_package(&self, package_id: i64) -> Result<Option<Package>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(packages::fetch_package(package_id, &mut conn).await?)
    }

    async fn fetch_ticker_package(&self) -> Result<Option<Package>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(packages::fetch_ticker_package(&mut conn).await?)
    }

    async fn fetch_listing(&self, listing_id: i64) -> Result<Option<Listing>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(listings::fetch_listing(listing_id, &mut conn).await?)
    }

    async fn fetch_transaction(&self, tx_id: i64) -> Result<Option<Transaction>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_by_id(tx_id, &mut conn).await?)
    }

    async fn fetch_transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_by_reference(reference, &mut conn).await?)
    }

    async fn fetch_ticker_slot(&self) -> Result<TickerSlot, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(ticker::fetch_slot(&mut conn).await?)
    }
}

impl PromoGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_pending_transaction(&self, tx: NewTransaction) -> Result<Transaction, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::insert(tx, TxStatus::Pending, &mut conn).await
    }

    async fn create_settled_claim(&self, tx: NewTransaction) -> Result<Transaction, PromoGatewayError> {
        let mut db_tx = self.pool.begin().await?;
        let row = transactions::insert(tx, TxStatus::Success, &mut db_tx).await?;
        let row = transactions::attach_claim_reference(row.id, &mut db_tx).await?;
        db_tx.commit().await?;
        debug!("🗃️ Claim transaction #{} settled as {}", row.id, row.status);
        Ok(row)
    }

    async fn attach_gateway_reference(&self, tx_id: i64, reference: &str) -> Result<Transaction, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::attach_reference(tx_id, reference, &mut conn)
            .await?
            .ok_or(PromoGatewayError::TransactionAlreadyFinal(tx_id))
    }

    async fn fail_pending_transaction(&self, tx_id: i64, reason: &str) -> Result<Transaction, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::mark_failed(tx_id, reason, &mut conn)
            .await?
            .ok_or(PromoGatewayError::TransactionAlreadyFinal(tx_id))
    }

    async fn finalize_transaction(
        &self,
        reference: &str,
        status: TxStatus,
        error_message: Option<&str>,
    ) -> Result<FinalizeResult, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        match transactions::finalize_by_reference(reference, status, error_message, &mut conn).await? {
            Some(row) => Ok(FinalizeResult { transaction: row, applied: true }),
            None => {
                // The conditional update matched nothing: either the reference is unknown, or a concurrent
                // delivery already finalized the row.
                let row = transactions::fetch_by_reference(reference, &mut conn)
                    .await?
                    .ok_or_else(|| PromoGatewayError::TransactionNotFound(reference.to_string()))?;
                Ok(FinalizeResult { transaction: row, applied: false })
            },
        }
    }

    async fn expire_transaction(&self, tx_id: i64) -> Result<Option<Transaction>, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::expire_one(tx_id, &mut conn).await
    }

    async fn apply_boost(&self, listing_id: i64, until: DateTime<Utc>) -> Result<Listing, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        listings::apply_boost(listing_id, until, &mut conn).await
    }

    async fn reassign_ticker(
        &self,
        listing_id: i64,
        owner: &UserId,
        claimed_at: DateTime<Utc>,
    ) -> Result<(TickerSlot, TickerSlot), PromoGatewayError> {
        let mut db_tx = self.pool.begin().await?;
        let previous = ticker::fetch_slot(&mut db_tx).await?;
        let slot = ticker::overwrite_slot(listing_id, owner, claimed_at, &mut db_tx).await?;
        db_tx.commit().await?;
        debug!("🗃️ Ticker slot reassigned to listing #{listing_id} (owner {owner})");
        Ok((slot, previous))
    }

    async fn record_notification(&self, user: &UserId, kind: &str, body: &str) -> Result<(), PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert(user, kind, body, &mut conn).await?;
        Ok(())
    }

    async fn fetch_notifications(&self, user: &UserId) -> Result<Vec<Notification>, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::fetch_for_user(user, &mut conn).await?)
    }

    async fn expire_overdue_boosts(&self, now: DateTime<Utc>) -> Result<Vec<Listing>, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        listings::expire_overdue(now, &mut conn).await
    }

    async fn expire_overdue_transactions(&self, now: DateTime<Utc>) -> Result<Vec<Transaction>, PromoGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::expire_overdue(now, &mut conn).await
    }

    async fn force_expire_boost(
        &self,
        listing_id: i64,
        operator: &UserId,
        reason: &str,
    ) -> Result<Listing, PromoGatewayError> {
        let mut db_tx = self.pool.begin().await?;
        let listing = listings::clear_premium(listing_id, &mut db_tx).await?;
        audit::insert(operator, "force_expire_boost", &format!("listing:{listing_id}"), reason, &mut db_tx).await?;
        db_tx.commit().await?;
        info!("🗃️ Boost on listing #{listing_id} force-expired by {operator}. Reason: {reason}");
        Ok(listing)
    }
}
