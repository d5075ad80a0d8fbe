use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Listing, NewTransaction, Notification, TickerSlot, Transaction, TxStatus, UserId},
    traits::{CatalogApiError, CatalogManagement, FinalizeResult},
};

/// The mutating half of a promotion gateway backend.
///
/// Every method is a complete unit of work: a backend must not expose intermediate states to concurrent
/// callers. Status transitions on the ledger are conditional on the row still being `Pending` — a terminal
/// row is never written again.
#[allow(async_fn_in_trait)]
pub trait PromoGatewayDatabase: Clone + CatalogManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Insert a new `Pending` ledger row. `expires_at` is taken from the [`NewTransaction`] and is fixed
    /// for the life of the row.
    async fn create_pending_transaction(&self, tx: NewTransaction) -> Result<Transaction, PromoGatewayError>;

    /// Insert a ledger row that is born `Success`, for the synchronous ticker-claim pathway. The gateway
    /// reference is generated from the row id (`claim-<id>`) so the row remains addressable by reference.
    async fn create_settled_claim(&self, tx: NewTransaction) -> Result<Transaction, PromoGatewayError>;

    /// Record the aggregator's reference on a freshly created transaction. Fails if the transaction is no
    /// longer `Pending`.
    async fn attach_gateway_reference(&self, tx_id: i64, reference: &str) -> Result<Transaction, PromoGatewayError>;

    /// Mark a transaction `Failed` with the gateway's decoded reason, conditional on it still being
    /// `Pending`. Used when the aggregator rejects the charge synchronously, so no row is ever left
    /// `Pending` after a synchronous rejection.
    async fn fail_pending_transaction(&self, tx_id: i64, reason: &str) -> Result<Transaction, PromoGatewayError>;

    /// Transition the transaction matching `reference` to the given terminal status, conditional on it
    /// still being `Pending`.
    ///
    /// Returns [`FinalizeResult::applied`] = `false` when the conditional update matched no row, i.e. a
    /// concurrent delivery of the same callback already finalized it. The returned transaction reflects the
    /// row as it stands after the call either way.
    async fn finalize_transaction(
        &self,
        reference: &str,
        status: TxStatus,
        error_message: Option<&str>,
    ) -> Result<FinalizeResult, PromoGatewayError>;

    /// Transition a single `Pending` transaction to `Expired` (conditional update). Returns the row if the
    /// transition happened, `None` if it was already terminal.
    async fn expire_transaction(&self, tx_id: i64) -> Result<Option<Transaction>, PromoGatewayError>;

    /// Set `is_premium = true` and `premium_until = until` on the listing. Safe to retry: re-applying
    /// merely rewrites the same promotion window.
    async fn apply_boost(&self, listing_id: i64, until: DateTime<Utc>) -> Result<Listing, PromoGatewayError>;

    /// Atomically overwrite the singleton ticker slot with the new occupant, returning the new slot state
    /// and the state it replaced. The read of the previous occupant and the overwrite happen in a single
    /// database transaction, so two concurrent winners serialize cleanly and the final state is never a mix
    /// of both.
    async fn reassign_ticker(
        &self,
        listing_id: i64,
        owner: &UserId,
        claimed_at: DateTime<Utc>,
    ) -> Result<(TickerSlot, TickerSlot), PromoGatewayError>;

    /// Best-effort notification insert. Failures are surfaced as errors so the caller can log them, but
    /// callers must never treat them as fatal to the surrounding flow.
    async fn record_notification(&self, user: &UserId, kind: &str, body: &str) -> Result<(), PromoGatewayError>;

    /// The notifications recorded for a user, newest first.
    async fn fetch_notifications(&self, user: &UserId) -> Result<Vec<Notification>, PromoGatewayError>;

    /// Demote every listing whose promotion window has lapsed:
    /// `is_premium = true AND premium_until < now`. Pure batch transition; idempotent by construction since
    /// demoted rows no longer match the predicate. Returns the listings that were demoted by *this* call.
    async fn expire_overdue_boosts(&self, now: DateTime<Utc>) -> Result<Vec<Listing>, PromoGatewayError>;

    /// Reconcile abandoned ledger rows: every `Pending` transaction past its `expires_at` becomes
    /// `Expired`. Returns the rows reconciled by this call.
    async fn expire_overdue_transactions(&self, now: DateTime<Utc>) -> Result<Vec<Transaction>, PromoGatewayError>;

    /// Admin override: clear `is_premium`/`premium_until` immediately and write an audit log entry with the
    /// operator id and their free-text reason, in one database transaction. Performs no ledger bookkeeping.
    async fn force_expire_boost(
        &self,
        listing_id: i64,
        operator: &UserId,
        reason: &str,
    ) -> Result<Listing, PromoGatewayError>;
}

#[derive(Debug, Error)]
pub enum PromoGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No transaction matches gateway reference [{0}]")]
    TransactionNotFound(String),
    #[error("Transaction {0} does not exist")]
    TransactionIdNotFound(i64),
    #[error("Transaction {0} is past its payment window")]
    TransactionExpired(i64),
    #[error("Transaction {0} is already in a terminal state")]
    TransactionAlreadyFinal(i64),
    #[error("Package {0} does not exist")]
    PackageNotFound(i64),
    #[error("Package {0} is not active")]
    PackageInactive(i64),
    #[error("No active ticker package is configured")]
    NoTickerPackage,
    #[error("Listing {0} does not exist")]
    ListingNotFound(i64),
    #[error("Listing {listing_id} does not belong to user {user_id}")]
    NotListingOwner { listing_id: i64, user_id: UserId },
    #[error("Listing {0} is not in an approved state")]
    ListingNotApproved(i64),
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),
}

impl From<sqlx::Error> for PromoGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PromoGatewayError::DatabaseError(e.to_string())
    }
}

impl From<CatalogApiError> for PromoGatewayError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(s) => PromoGatewayError::DatabaseError(s),
        }
    }
}
