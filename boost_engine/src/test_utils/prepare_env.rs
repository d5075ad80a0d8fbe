use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// A fresh, fully migrated in-memory database. Each call gives a completely isolated instance.
pub async fn new_test_database() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let db = SqliteDatabase::new_in_memory().await.expect("Error creating in-memory database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready");
    db
}

/// A url for a throwaway file-backed database. Use this instead of [`new_test_database`] when a test needs
/// real cross-connection concurrency; the in-memory pool is pinned to a single connection.
pub fn random_db_url() -> String {
    format!("sqlite://{}/bps_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

/// Creates and migrates a file-backed database at `url` with a multi-connection pool.
pub async fn new_file_database(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

/// Best-effort removal of a database created with [`new_file_database`].
pub async fn drop_file_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
}
