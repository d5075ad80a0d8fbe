use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::UserId;

pub async fn insert(
    operator: &UserId,
    action: &str,
    target: &str,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO audit_log (operator_id, action, target, reason, created_at) VALUES ($1, $2, $3, $4, $5)")
        .bind(operator)
        .bind(action)
        .bind(target)
        .bind(reason)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}
