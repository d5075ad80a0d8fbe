use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, Transaction, TxStatus},
    traits::PromoGatewayError,
};

/// Inserts a new ledger row with the given initial status and returns it.
pub async fn insert(
    tx: NewTransaction,
    status: TxStatus,
    conn: &mut SqliteConnection,
) -> Result<Transaction, PromoGatewayError> {
    let now = Utc::now();
    let row: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                listing_id,
                user_id,
                package_id,
                amount,
                provider,
                phone_number,
                status,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(tx.listing_id)
    .bind(tx.user_id)
    .bind(tx.package_id)
    .bind(tx.amount)
    .bind(tx.provider)
    .bind(tx.phone_number)
    .bind(status.to_string())
    .bind(tx.expires_at)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Transaction #{} created with status {}", row.id, row.status);
    Ok(row)
}

pub async fn fetch_by_id(tx_id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(tx_id).fetch_optional(conn).await
}

pub async fn fetch_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transactions WHERE gateway_reference = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await
}

/// Stores the aggregator's reference on the row, conditional on it still being `Pending`.
pub async fn attach_reference(
    tx_id: i64,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PromoGatewayError> {
    let row = sqlx::query_as(
        "UPDATE transactions SET gateway_reference = $1, updated_at = $2 WHERE id = $3 AND status = 'Pending' \
         RETURNING *",
    )
    .bind(reference)
    .bind(Utc::now())
    .bind(tx_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Assigns the self-referential `claim-<id>` reference used by the synchronous ticker-claim pathway.
pub async fn attach_claim_reference(
    tx_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Transaction, PromoGatewayError> {
    let row: Option<Transaction> = sqlx::query_as(
        "UPDATE transactions SET gateway_reference = 'claim-' || id, updated_at = $1 WHERE id = $2 RETURNING *",
    )
    .bind(Utc::now())
    .bind(tx_id)
    .fetch_optional(conn)
    .await?;
    row.ok_or(PromoGatewayError::TransactionIdNotFound(tx_id))
}

/// The single conditional write that closes the race between concurrent deliveries of the same callback:
/// the row moves to a terminal status only if it is still `Pending`. Returns `None` when the condition did
/// not hold (already terminal).
pub async fn finalize_by_reference(
    reference: &str,
    status: TxStatus,
    error_message: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PromoGatewayError> {
    let row = sqlx::query_as(
        "UPDATE transactions SET status = $1, error_message = $2, updated_at = $3 WHERE gateway_reference = $4 AND \
         status = 'Pending' RETURNING *",
    )
    .bind(status.to_string())
    .bind(error_message)
    .bind(Utc::now())
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Conditional `Pending` → `Expired` transition for a single row.
pub async fn expire_one(tx_id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, PromoGatewayError> {
    let row = sqlx::query_as(
        "UPDATE transactions SET status = 'Expired', updated_at = $1 WHERE id = $2 AND status = 'Pending' RETURNING *",
    )
    .bind(Utc::now())
    .bind(tx_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Marks the row `Failed` with the gateway's decoded reason, conditional on it still being `Pending`.
pub async fn mark_failed(
    tx_id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PromoGatewayError> {
    let row = sqlx::query_as(
        "UPDATE transactions SET status = 'Failed', error_message = $1, updated_at = $2 WHERE id = $3 AND status = \
         'Pending' RETURNING *",
    )
    .bind(reason)
    .bind(Utc::now())
    .bind(tx_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Batch reconciliation of abandoned rows: every `Pending` transaction past its payment window becomes
/// `Expired`. The predicate excludes already-terminal rows, so back-to-back runs are no-ops after the
/// first.
pub async fn expire_overdue(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, PromoGatewayError> {
    let rows = sqlx::query_as(
        "UPDATE transactions SET status = 'Expired', error_message = 'No settlement received within the payment \
         window', updated_at = $1 WHERE status = 'Pending' AND expires_at < $1 RETURNING *",
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
