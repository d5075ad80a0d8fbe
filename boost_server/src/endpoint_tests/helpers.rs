//! Shared plumbing for the endpoint tests: a fixed signing secret, token minting, and request drivers that
//! stand up a test `App` with the same middleware stack the real server uses.
use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use boost_engine::db_types::Roles;
use bps_common::Secret;
use serde::Serialize;

use crate::{
    auth::{TokenIssuer, TokenVerifier, AUTH_HEADER},
    config::{AuthConfig, PayGateConfig},
    helpers::calculate_hmac,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory, SignaturePolicy, PAYGATE_HMAC_HEADER},
};

pub const WEBHOOK_SECRET: &str = "webhook-test-secret";

// Creates a test `AuthConfig` with a fixed secret so that minted tokens verify. DO NOT re-use this secret
// anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("fe95c764a8109725bdcb33c817b1bcc1bbb2b0f19312279f83a16b03de2ad1d5".into()) }
}

pub fn issue_token(user: &str, roles: Roles) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user.into(), roles, None).expect("Failed to sign token")
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path);
    authenticated_request(req, token, configure).await
}

pub async fn post_request<T: Serialize>(
    token: &str,
    path: &str,
    body: T,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::post().uri(path).set_json(body);
    authenticated_request(req, token, configure).await
}

async fn authenticated_request(
    mut req: TestRequest,
    token: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    if !token.is_empty() {
        req = req.insert_header((AUTH_HEADER, token));
    }
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().wrap(JwtMiddlewareFactory::new(verifier)).configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// Posts a raw payload to the settlement webhook, behind the same HMAC middleware the real server mounts.
/// Pass `signature: None` to sign the body correctly with [`WEBHOOK_SECRET`], or `Some(..)` to send a
/// specific (e.g. forged) signature.
pub async fn webhook_request(
    payload: &str,
    signature: Option<&str>,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let hmac = match signature {
        Some(sig) => sig.to_string(),
        None => calculate_hmac(WEBHOOK_SECRET, payload.as_bytes()),
    };
    let req = TestRequest::post()
        .uri("/settlement")
        .insert_header((PAYGATE_HMAC_HEADER, hmac))
        .insert_header(("content-type", "application/json"))
        .set_payload(payload.to_string())
        .to_request();
    let paygate =
        PayGateConfig { hmac_secret: Secret::new(WEBHOOK_SECRET.to_string()), hmac_checks: true, ..Default::default() };
    let app = App::new().wrap(HmacMiddlewareFactory::new(SignaturePolicy::for_paygate(&paygate))).configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
