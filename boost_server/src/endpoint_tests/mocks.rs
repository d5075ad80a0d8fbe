use boost_engine::{
    db_types::{Listing, NewTransaction, Notification, Package, TickerSlot, Transaction, TxStatus, UserId},
    traits::{CatalogApiError, CatalogManagement, FinalizeResult, PromoGatewayDatabase, PromoGatewayError},
};
use chrono::{DateTime, Duration, Utc};
use mockall::mock;

use crate::integrations::paygate::{ChargeAck, ChargeRequest, GatewayError, MobileMoneyGateway};

mock! {
    pub PromoDb {}

    impl Clone for PromoDb {
        fn clone(&self) -> Self;
    }

    impl CatalogManagement for PromoDb {
        async fn fetch_active_packages(&self) -> Result<Vec<Package>, CatalogApiError>;
        async fn fetch_package(&self, package_id: i64) -> Result<Option<Package>, CatalogApiError>;
        async fn fetch_ticker_package(&self) -> Result<Option<Package>, CatalogApiError>;
        async fn fetch_listing(&self, listing_id: i64) -> Result<Option<Listing>, CatalogApiError>;
        async fn fetch_transaction(&self, tx_id: i64) -> Result<Option<Transaction>, CatalogApiError>;
        async fn fetch_transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>, CatalogApiError>;
        async fn fetch_ticker_slot(&self) -> Result<TickerSlot, CatalogApiError>;
    }

    impl PromoGatewayDatabase for PromoDb {
        fn url(&self) -> &str;
        async fn create_pending_transaction(&self, tx: NewTransaction) -> Result<Transaction, PromoGatewayError>;
        async fn create_settled_claim(&self, tx: NewTransaction) -> Result<Transaction, PromoGatewayError>;
        async fn attach_gateway_reference(&self, tx_id: i64, reference: &str) -> Result<Transaction, PromoGatewayError>;
        async fn fail_pending_transaction(&self, tx_id: i64, reason: &str) -> Result<Transaction, PromoGatewayError>;
        async fn finalize_transaction<'a>(&self, reference: &str, status: TxStatus, error_message: Option<&'a str>) -> Result<FinalizeResult, PromoGatewayError>;
        async fn expire_transaction(&self, tx_id: i64) -> Result<Option<Transaction>, PromoGatewayError>;
        async fn apply_boost(&self, listing_id: i64, until: DateTime<Utc>) -> Result<Listing, PromoGatewayError>;
        async fn reassign_ticker(&self, listing_id: i64, owner: &UserId, claimed_at: DateTime<Utc>) -> Result<(TickerSlot, TickerSlot), PromoGatewayError>;
        async fn record_notification(&self, user: &UserId, kind: &str, body: &str) -> Result<(), PromoGatewayError>;
        async fn fetch_notifications(&self, user: &UserId) -> Result<Vec<Notification>, PromoGatewayError>;
        async fn expire_overdue_boosts(&self, now: DateTime<Utc>) -> Result<Vec<Listing>, PromoGatewayError>;
        async fn expire_overdue_transactions(&self, now: DateTime<Utc>) -> Result<Vec<Transaction>, PromoGatewayError>;
        async fn force_expire_boost(&self, listing_id: i64, operator: &UserId, reason: &str) -> Result<Listing, PromoGatewayError>;
    }
}

mock! {
    pub Gateway {}

    impl MobileMoneyGateway for Gateway {
        async fn request_charge(&self, charge: ChargeRequest) -> Result<ChargeAck, GatewayError>;
    }
}

// --- Fixtures ---

pub fn boost_package() -> Package {
    Package { id: 1, name: "Boost 7 jours".to_string(), price: 1500.into(), duration_days: 7, active: true }
}

pub fn listing(id: i64, seller: &str) -> Listing {
    Listing {
        id,
        seller_id: seller.into(),
        title: format!("{seller}'s listing"),
        status: boost_engine::db_types::ListingStatus::Approved,
        is_premium: false,
        premium_until: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn pending_tx(id: i64, user: &str, reference: Option<&str>) -> Transaction {
    Transaction {
        id,
        listing_id: 10,
        user_id: user.into(),
        package_id: 1,
        amount: 1500.into(),
        provider: "tmoney".to_string(),
        phone_number: Some("90123456".parse().unwrap()),
        status: TxStatus::Pending,
        gateway_reference: reference.map(String::from),
        error_message: None,
        expires_at: Utc::now() + Duration::minutes(2),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn settled_tx(id: i64, user: &str, reference: &str) -> Transaction {
    Transaction { status: TxStatus::Success, ..pending_tx(id, user, Some(reference)) }
}
