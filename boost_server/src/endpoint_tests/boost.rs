use actix_web::{http::StatusCode, web, web::ServiceConfig};
use boost_engine::{db_types::Role, events::EventProducers, SettlementApi};
use serde_json::json;

use super::{
    helpers::{issue_token, post_request},
    mocks::{boost_package, listing, pending_tx, MockGateway, MockPromoDb},
};
use crate::{
    config::ServerConfig,
    integrations::paygate::{ChargeAck, GatewayError},
    routes::BoostRoute,
};

fn boost_body() -> serde_json::Value {
    json!({ "listing_id": 10, "package_id": 1, "network": "tmoney", "phone_number": "90123456" })
}

#[actix_web::test]
async fn a_boost_purchase_dispatches_a_charge() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = post_request(&token, "/boost", boost_body(), configure_accepting_gateway)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "Unexpected body: {body}");
    assert!(body.contains(r#""transaction_id":7"#), "Unexpected body: {body}");
    assert!(body.contains(r#""tx_reference":"PG-77""#), "Unexpected body: {body}");
    assert!(body.contains(r#""amount":1500"#), "Unexpected body: {body}");
    assert!(body.contains(r#""status":"Pending""#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn a_rejected_charge_fails_the_transaction_and_returns_502() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = post_request(&token, "/boost", boost_body(), configure_rejecting_gateway)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        r#"{"error":"The payment gateway could not process the charge. The gateway rejected the charge. Error 400. Insufficient funds"}"#
    );
}

#[actix_web::test]
async fn you_cannot_boost_someone_elses_listing() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("mallory", vec![Role::User]);
    let (status, body) = post_request(&token, "/boost", boost_body(), configure_accepting_gateway)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. Listing 10 does not belong to user mallory"}"#);
}

fn configure_accepting_gateway(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway.expect_request_charge().returning(|_| Ok(ChargeAck { reference: "PG-77".to_string() }));
    configure(cfg, gateway);
}

fn configure_rejecting_gateway(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway.expect_request_charge().returning(|_| {
        Err(GatewayError::ChargeRejected { status: 400, message: "Insufficient funds".to_string() })
    });
    configure(cfg, gateway);
}

fn configure(cfg: &mut ServiceConfig, gateway: MockGateway) {
    let mut db = MockPromoDb::new();
    db.expect_fetch_package().returning(|id| Ok(Some(boost_package()).filter(|p| p.id == id)));
    db.expect_fetch_listing().returning(|id| Ok(Some(listing(id, "alice"))));
    db.expect_create_pending_transaction().returning(|_| Ok(pending_tx(7, "alice", None)));
    db.expect_attach_gateway_reference().returning(|id, reference| Ok(pending_tx(id, "alice", Some(reference))));
    db.expect_fail_pending_transaction().returning(|id, _| Ok(pending_tx(id, "alice", None)));
    let api = SettlementApi::new(db, EventProducers::default());
    cfg.service(BoostRoute::<MockPromoDb, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway))
        .app_data(web::Data::new(ServerConfig::default()));
}
