use thiserror::Error;

use crate::db_types::{Listing, Package, TickerSlot, Transaction};

/// Read-only queries against the promotion gateway backend: the package catalog, listings, ledger rows and
/// the current ticker occupant.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    /// All packages currently offered for sale, in catalog order.
    async fn fetch_active_packages(&self) -> Result<Vec<Package>, CatalogApiError>;

    async fn fetch_package(&self, package_id: i64) -> Result<Option<Package>, CatalogApiError>;

    /// The unique active package with `duration_days == 0`, if one is configured.
    async fn fetch_ticker_package(&self) -> Result<Option<Package>, CatalogApiError>;

    async fn fetch_listing(&self, listing_id: i64) -> Result<Option<Listing>, CatalogApiError>;

    async fn fetch_transaction(&self, tx_id: i64) -> Result<Option<Transaction>, CatalogApiError>;

    async fn fetch_transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>, CatalogApiError>;

    /// The singleton slot row. Always exists.
    async fn fetch_ticker_slot(&self) -> Result<TickerSlot, CatalogApiError>;
}

#[derive(Debug, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}
