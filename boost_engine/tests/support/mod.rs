#![allow(dead_code)]
use boost_engine::{
    db_types::{ListingStatus, PhoneNumber},
    events::EventProducers,
    test_utils,
    test_utils::new_test_database,
    SettlementApi,
    SqliteDatabase,
};

// Package ids from the catalog seed migration
pub const BOOST_7D_PACKAGE: i64 = 1;
pub const BOOST_14D_PACKAGE: i64 = 2;
pub const TICKER_PACKAGE: i64 = 4;

pub async fn new_api() -> SettlementApi<SqliteDatabase> {
    SettlementApi::new(new_test_database().await, EventProducers::default())
}

pub async fn seed_listing(db: &SqliteDatabase, seller: &str, status: ListingStatus) -> i64 {
    test_utils::seed_listing(db, seller, &format!("{seller}'s listing"), status).await
}

pub async fn seed_inactive_package(db: &SqliteDatabase) -> i64 {
    test_utils::seed_package(db, "Retired", 1000.into(), 3, false).await
}

pub fn phone() -> PhoneNumber {
    "90123456".parse().expect("valid test number")
}
