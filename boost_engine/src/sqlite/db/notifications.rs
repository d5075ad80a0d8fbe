use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{Notification, UserId};

pub async fn insert(user: &UserId, kind: &str, body: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO notifications (user_id, kind, body, created_at) VALUES ($1, $2, $3, $4)")
        .bind(user)
        .bind(kind)
        .bind(body)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_for_user(user: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user)
        .fetch_all(conn)
        .await
}
