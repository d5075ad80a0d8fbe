use crate::{
    db_types::{Notification, Package, TickerSlot, Transaction, UserId},
    traits::{CatalogApiError, CatalogManagement, PromoGatewayDatabase, PromoGatewayError},
};

/// Read-only views over the catalog, the ledger and the ticker slot.
#[derive(Debug, Clone)]
pub struct CatalogApi<B> {
    db: B,
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The purchasable packages, cheapest-and-shortest first. Inactive packages are omitted.
    pub async fn active_packages(&self) -> Result<Vec<Package>, CatalogApiError> {
        self.db.fetch_active_packages().await
    }

    pub async fn transaction(&self, tx_id: i64) -> Result<Option<Transaction>, CatalogApiError> {
        self.db.fetch_transaction(tx_id).await
    }

    /// Looks a ledger row up by the aggregator's reference, for clients that initiated a charge and only
    /// hold the `tx_reference` from the payment response.
    pub async fn transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>, CatalogApiError> {
        self.db.fetch_transaction_by_reference(reference).await
    }

    /// The current ticker occupant. Always succeeds; an unclaimed slot comes back with all fields `None`.
    pub async fn ticker_slot(&self) -> Result<TickerSlot, CatalogApiError> {
        self.db.fetch_ticker_slot().await
    }
}

impl<B> CatalogApi<B>
where B: PromoGatewayDatabase
{
    pub async fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>, PromoGatewayError> {
        self.db.fetch_notifications(user).await
    }
}
