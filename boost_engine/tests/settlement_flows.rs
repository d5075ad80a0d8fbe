//! End-to-end flows for boost purchases and settlement callbacks, against an in-memory SQLite backend.
use boost_engine::{
    db_types::{ListingStatus, Network, TxStatus},
    CatalogManagement,
    PromoGatewayError,
    SettlementEffect,
    SettlementStatus,
};
use chrono::{Duration, Utc};

mod support;

use support::{new_api, phone, seed_inactive_package, seed_listing, BOOST_7D_PACKAGE, TICKER_PACKAGE};

#[tokio::test]
async fn settled_boost_promotes_the_listing() {
    let api = new_api().await;
    let listing_id = seed_listing(api.db(), "alice", ListingStatus::Approved).await;
    let tx = api
        .initiate_boost(listing_id, &"alice".into(), BOOST_7D_PACKAGE, Network::TMoney, phone(), Duration::minutes(2))
        .await
        .expect("Error initiating boost");
    assert_eq!(tx.status, TxStatus::Pending);
    assert_eq!(tx.amount, 1500.into());
    api.record_gateway_ack(tx.id, "PG-1001").await.expect("Error recording ack");

    let outcome = api.process_settlement("PG-1001", SettlementStatus::Success, None).await.expect("Error settling");
    assert!(!outcome.duplicate);
    assert_eq!(outcome.transaction.status, TxStatus::Success);
    let listing = match outcome.effect {
        SettlementEffect::Boosted(l) => l,
        other => panic!("Expected a boost, got {other:?}"),
    };
    assert!(listing.is_premium);
    let until = listing.premium_until.expect("premium_until must be set");
    assert!(until > Utc::now() + Duration::days(6));
    assert!(until < Utc::now() + Duration::days(8));
}

#[tokio::test]
async fn repeated_deliveries_settle_exactly_once() {
    let api = new_api().await;
    let listing_id = seed_listing(api.db(), "alice", ListingStatus::Approved).await;
    let tx = api
        .initiate_boost(listing_id, &"alice".into(), BOOST_7D_PACKAGE, Network::Flooz, phone(), Duration::minutes(2))
        .await
        .unwrap();
    api.record_gateway_ack(tx.id, "PG-2002").await.unwrap();

    let first = api.process_settlement("PG-2002", SettlementStatus::Success, None).await.unwrap();
    assert!(!first.duplicate);
    // The aggregator redelivers the same callback twice more.
    for _ in 0..2 {
        let repeat = api.process_settlement("PG-2002", SettlementStatus::Success, None).await.unwrap();
        assert!(repeat.duplicate);
        assert!(matches!(repeat.effect, SettlementEffect::None));
        assert_eq!(repeat.transaction.status, TxStatus::Success);
    }
    // A contradictory late delivery cannot flip the terminal status either.
    let flip = api.process_settlement("PG-2002", SettlementStatus::Failed, Some("nope")).await.unwrap();
    assert!(flip.duplicate);
    assert_eq!(flip.transaction.status, TxStatus::Success);
    assert!(flip.transaction.error_message.is_none());
}

#[tokio::test]
async fn failed_settlement_grants_nothing() {
    let api = new_api().await;
    let listing_id = seed_listing(api.db(), "bob", ListingStatus::Approved).await;
    let tx = api
        .initiate_boost(listing_id, &"bob".into(), BOOST_7D_PACKAGE, Network::TMoney, phone(), Duration::minutes(2))
        .await
        .unwrap();
    api.record_gateway_ack(tx.id, "PG-3003").await.unwrap();

    let outcome = api.process_settlement("PG-3003", SettlementStatus::Failed, Some("Insufficient funds")).await.unwrap();
    assert_eq!(outcome.transaction.status, TxStatus::Failed);
    assert_eq!(outcome.transaction.error_message.as_deref(), Some("Insufficient funds"));
    assert!(matches!(outcome.effect, SettlementEffect::None));
    let listing = api.db().fetch_listing(listing_id).await.unwrap().unwrap();
    assert!(!listing.is_premium);
}

#[tokio::test]
async fn late_settlement_is_rejected_and_the_row_expired() {
    let api = new_api().await;
    let listing_id = seed_listing(api.db(), "carol", ListingStatus::Approved).await;
    // A payment window that has already lapsed.
    let tx = api
        .initiate_boost(listing_id, &"carol".into(), BOOST_7D_PACKAGE, Network::TMoney, phone(), Duration::seconds(-5))
        .await
        .unwrap();
    api.record_gateway_ack(tx.id, "PG-4004").await.unwrap();

    let err = api.process_settlement("PG-4004", SettlementStatus::Success, None).await.unwrap_err();
    assert!(matches!(err, PromoGatewayError::TransactionExpired(id) if id == tx.id));
    let row = api.db().fetch_transaction(tx.id).await.unwrap().unwrap();
    assert_eq!(row.status, TxStatus::Expired);
    // Money that arrives after expiry never promotes anything.
    let listing = api.db().fetch_listing(listing_id).await.unwrap().unwrap();
    assert!(!listing.is_premium);
    // And the now-terminal row treats further deliveries as duplicates.
    let repeat = api.process_settlement("PG-4004", SettlementStatus::Success, None).await.unwrap();
    assert!(repeat.duplicate);
    assert_eq!(repeat.transaction.status, TxStatus::Expired);
}

#[tokio::test]
async fn unknown_reference_is_an_error() {
    let api = new_api().await;
    let err = api.process_settlement("no-such-ref", SettlementStatus::Success, None).await.unwrap_err();
    assert!(matches!(err, PromoGatewayError::TransactionNotFound(_)));
}

#[tokio::test]
async fn pending_verdict_keeps_the_row_open() {
    let api = new_api().await;
    let listing_id = seed_listing(api.db(), "dave", ListingStatus::Approved).await;
    let tx = api
        .initiate_boost(listing_id, &"dave".into(), BOOST_7D_PACKAGE, Network::Flooz, phone(), Duration::minutes(2))
        .await
        .unwrap();
    api.record_gateway_ack(tx.id, "PG-5005").await.unwrap();

    let ping = api.process_settlement("PG-5005", SettlementStatus::Pending, None).await.unwrap();
    assert!(!ping.duplicate);
    assert_eq!(ping.transaction.status, TxStatus::Pending);
    // The decisive delivery still lands.
    let outcome = api.process_settlement("PG-5005", SettlementStatus::Success, None).await.unwrap();
    assert!(!outcome.duplicate);
    assert_eq!(outcome.transaction.status, TxStatus::Success);
}

#[tokio::test]
async fn purchases_are_validated_before_any_ledger_write() {
    let api = new_api().await;
    let approved = seed_listing(api.db(), "erin", ListingStatus::Approved).await;
    let pending = seed_listing(api.db(), "erin", ListingStatus::Pending).await;
    let user = "erin".into();

    let err = api.initiate_boost(approved, &user, 999, Network::TMoney, phone(), Duration::minutes(2)).await.unwrap_err();
    assert!(matches!(err, PromoGatewayError::PackageNotFound(999)));

    let retired = seed_inactive_package(api.db()).await;
    let err = api.initiate_boost(approved, &user, retired, Network::TMoney, phone(), Duration::minutes(2)).await.unwrap_err();
    assert!(matches!(err, PromoGatewayError::PackageInactive(_)));

    let err = api
        .initiate_boost(approved, &user, TICKER_PACKAGE, Network::TMoney, phone(), Duration::minutes(2))
        .await
        .unwrap_err();
    assert!(matches!(err, PromoGatewayError::UnsupportedAction(_)));

    let err = api
        .initiate_boost(approved, &"mallory".into(), BOOST_7D_PACKAGE, Network::TMoney, phone(), Duration::minutes(2))
        .await
        .unwrap_err();
    assert!(matches!(err, PromoGatewayError::NotListingOwner { .. }));

    let err = api.initiate_boost(pending, &user, BOOST_7D_PACKAGE, Network::TMoney, phone(), Duration::minutes(2)).await.unwrap_err();
    assert!(matches!(err, PromoGatewayError::ListingNotApproved(_)));

    let err = api.initiate_boost(999, &user, BOOST_7D_PACKAGE, Network::TMoney, phone(), Duration::minutes(2)).await.unwrap_err();
    assert!(matches!(err, PromoGatewayError::ListingNotFound(999)));
}

#[tokio::test]
async fn synchronous_rejection_fails_the_row_immediately() {
    let api = new_api().await;
    let listing_id = seed_listing(api.db(), "frank", ListingStatus::Approved).await;
    let tx = api
        .initiate_boost(listing_id, &"frank".into(), BOOST_7D_PACKAGE, Network::TMoney, phone(), Duration::minutes(2))
        .await
        .unwrap();
    let failed = api.reject_charge(tx.id, "Subscriber unknown").await.unwrap();
    assert_eq!(failed.status, TxStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("Subscriber unknown"));
    // The row is terminal, so a reference can no longer be attached to it.
    let err = api.record_gateway_ack(tx.id, "PG-6006").await.unwrap_err();
    assert!(matches!(err, PromoGatewayError::TransactionAlreadyFinal(id) if id == tx.id));
}
