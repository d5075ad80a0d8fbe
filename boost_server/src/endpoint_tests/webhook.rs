use actix_web::{http::StatusCode, web, web::ServiceConfig};
use boost_engine::{
    db_types::{Transaction, TxStatus},
    events::EventProducers,
    traits::FinalizeResult,
    SettlementApi,
};
use chrono::{Duration, Utc};

use super::{
    helpers::webhook_request,
    mocks::{boost_package, listing, pending_tx, settled_tx, MockPromoDb},
};
use crate::routes::SettlementWebhookRoute;

#[actix_web::test]
async fn a_successful_settlement_boosts_the_listing() {
    let _ = env_logger::try_init().ok();
    let payload = r#"{"tx_reference":"PG-100","status":"success"}"#;
    let (status, body) = webhook_request(payload, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Listing #10 boosted"}"#);
}

#[actix_web::test]
async fn a_duplicate_delivery_is_a_no_op() {
    let _ = env_logger::try_init().ok();
    let payload = r#"{"tx_reference":"PG-SETTLED","status":"success"}"#;
    let (status, body) = webhook_request(payload, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Already settled; duplicate delivery ignored"}"#);
}

#[actix_web::test]
async fn a_forged_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = r#"{"tx_reference":"PG-100","status":"success"}"#;
    let err = webhook_request(payload, Some("bm90IGEgcmVhbCBzaWduYXR1cmU="), configure)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn an_unknown_reference_is_a_404() {
    let _ = env_logger::try_init().ok();
    let payload = r#"{"tx_reference":"PG-404","status":"success"}"#;
    let (status, body) = webhook_request(payload, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. No transaction matches gateway reference [PG-404]"}"#);
}

#[actix_web::test]
async fn a_late_settlement_is_rejected_with_410() {
    let _ = env_logger::try_init().ok();
    let payload = r#"{"tx_reference":"PG-LATE","status":"success"}"#;
    let (status, body) = webhook_request(payload, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body, r#"{"error":"The payment window for this transaction has closed. Transaction 6 is past its payment window"}"#);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockPromoDb::new();
    db.expect_fetch_transaction_by_reference().returning(|reference| {
        let tx = match reference {
            "PG-100" => Some(pending_tx(5, "alice", Some("PG-100"))),
            "PG-SETTLED" => Some(settled_tx(5, "alice", "PG-SETTLED")),
            "PG-LATE" => Some(Transaction {
                expires_at: Utc::now() - Duration::minutes(5),
                ..pending_tx(6, "alice", Some("PG-LATE"))
            }),
            _ => None,
        };
        Ok(tx)
    });
    db.expect_finalize_transaction().returning(|reference, status, _| {
        Ok(FinalizeResult { transaction: settled_tx(5, "alice", reference), applied: status == TxStatus::Success })
    });
    db.expect_expire_transaction().returning(|id| {
        Ok(Some(Transaction { status: TxStatus::Expired, ..pending_tx(id, "alice", Some("PG-LATE")) }))
    });
    db.expect_fetch_package().returning(|_| Ok(Some(boost_package())));
    db.expect_apply_boost().returning(|id, until| {
        Ok(boost_engine::db_types::Listing {
            is_premium: true,
            premium_until: Some(until),
            ..listing(id, "alice")
        })
    });
    let api = SettlementApi::new(db, EventProducers::default());
    cfg.service(SettlementWebhookRoute::<MockPromoDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(crate::config::ServerConfig::default()));
}
