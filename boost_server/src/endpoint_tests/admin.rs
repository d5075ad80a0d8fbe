use actix_web::{http::StatusCode, web, web::ServiceConfig};
use boost_engine::{db_types::Role, events::EventProducers, SettlementApi};
use serde_json::json;

use super::{
    helpers::{issue_token, post_request},
    mocks::{listing, MockPromoDb},
};
use crate::routes::{ForceExpireRoute, SweepRoute};

#[actix_web::test]
async fn force_expire_as_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("admin", vec![Role::User, Role::Admin]);
    let body = json!({ "listing_id": 10, "reason": "fraudulent listing" });
    let (status, body) = post_request(&token, "/admin/expire_boost", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""is_premium":false"#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn force_expire_as_plain_user() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("mallory", vec![Role::User]);
    let body = json!({ "listing_id": 10, "reason": "I want the slot" });
    let err = post_request(&token, "/admin/expire_boost", body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn sweep_on_demand_as_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("admin", vec![Role::Admin]);
    let (status, body) =
        post_request(&token, "/admin/sweep", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"0 lapsed boost(s) demoted, 0 abandoned transaction(s) reconciled"}"#);
}

#[actix_web::test]
async fn sweep_as_plain_user() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("mallory", vec![Role::User]);
    let err = post_request(&token, "/admin/sweep", json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockPromoDb::new();
    db.expect_fetch_listing().returning(|id| Ok(Some(listing(id, "alice"))));
    db.expect_force_expire_boost().returning(|id, _, _| Ok(listing(id, "alice")));
    db.expect_expire_overdue_boosts().returning(|_| Ok(vec![]));
    db.expect_expire_overdue_transactions().returning(|_| Ok(vec![]));
    let api = SettlementApi::new(db, EventProducers::default());
    cfg.service(ForceExpireRoute::<MockPromoDb>::new())
        .service(SweepRoute::<MockPromoDb>::new())
        .app_data(web::Data::new(api));
}
