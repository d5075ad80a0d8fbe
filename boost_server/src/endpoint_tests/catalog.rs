use actix_web::{http::StatusCode, web, web::ServiceConfig};
use boost_engine::{db_types::Role, CatalogApi};

use super::{
    helpers::{get_request, issue_token},
    mocks::{boost_package, settled_tx, MockPromoDb},
};
use crate::routes::{PackagesRoute, TickerRoute, TransactionByIdRoute, TransactionByReferenceRoute};

const PACKAGES_JSON: &str = r#"[{"id":1,"name":"Boost 7 jours","price":1500,"duration_days":7,"active":true}]"#;

#[actix_web::test]
async fn fetch_packages_without_a_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/packages", configure).await.expect_err("Expected error");
    assert_eq!(err, "Access token invalid or not provided");
}

#[actix_web::test]
async fn fetch_packages_with_a_tampered_token() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token("alice", vec![Role::User]);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let err = get_request(&token, "/packages", configure).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error."), "Unexpected error: {err}");
}

#[actix_web::test]
async fn fetch_packages() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/packages", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, PACKAGES_JSON);
}

#[actix_web::test]
async fn fetch_the_ticker_slot() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/ticker", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"current_listing_id":null,"owner_id":null,"claimed_at":null}"#);
}

#[actix_web::test]
async fn fetch_my_own_transaction() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/transaction/15", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""id":15"#), "Unexpected body: {body}");
    assert!(body.contains(r#""status":"Success""#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_another_users_transaction_as_plain_user() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("mallory", vec![Role::User]);
    let (status, body) = get_request(&token, "/transaction/15", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. You may only view your own transactions"}"#);
}

#[actix_web::test]
async fn fetch_another_users_transaction_as_auditor() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("auditor", vec![Role::ReadAll]);
    let (status, body) = get_request(&token, "/transaction/15", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""user_id":"alice""#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn poll_a_transaction_by_its_gateway_reference() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) =
        get_request(&token, "/transaction/by_reference/PG-100", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""gateway_reference":"PG-100""#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn poll_an_unknown_gateway_reference() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) =
        get_request(&token, "/transaction/by_reference/PG-404", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Transaction with reference PG-404"}"#);
}

#[actix_web::test]
async fn poll_another_users_reference_as_plain_user() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("mallory", vec![Role::User]);
    let (status, body) =
        get_request(&token, "/transaction/by_reference/PG-100", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. You may only view your own transactions"}"#);
}

#[actix_web::test]
async fn fetch_a_missing_transaction() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/transaction/99", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Transaction 99"}"#);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockPromoDb::new();
    db.expect_fetch_active_packages().returning(|| Ok(vec![boost_package()]));
    db.expect_fetch_ticker_slot().returning(|| {
        Ok(boost_engine::db_types::TickerSlot { current_listing_id: None, owner_id: None, claimed_at: None })
    });
    db.expect_fetch_transaction().returning(|id| match id {
        99 => Ok(None),
        id => Ok(Some(settled_tx(id, "alice", "PG-100"))),
    });
    db.expect_fetch_transaction_by_reference().returning(|reference| match reference {
        "PG-404" => Ok(None),
        reference => Ok(Some(settled_tx(15, "alice", reference))),
    });
    let catalog_api = CatalogApi::new(db);
    cfg.service(PackagesRoute::<MockPromoDb>::new())
        .service(TickerRoute::<MockPromoDb>::new())
        .service(TransactionByIdRoute::<MockPromoDb>::new())
        .service(TransactionByReferenceRoute::<MockPromoDb>::new())
        .app_data(web::Data::new(catalog_api));
}
