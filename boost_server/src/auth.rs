//! Access-token handling.
//!
//! Tokens are ordinary HS256 JWTs. The signing secret is shared with the main marketplace backend, which
//! authenticates users and issues their tokens; this server only verifies them. Claims carry the user id
//! and the granted roles. Tokens are supplied in the `bps_access_token` header.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use boost_engine::db_types::{Roles, UserId};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError};

pub const AUTH_HEADER: &str = "bps_access_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The marketplace user id.
    pub sub: UserId,
    pub roles: Roles,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(sub: UserId, roles: Roles, expires_at: DateTime<Utc>) -> Self {
        Self { sub, roles, exp: expires_at.timestamp() }
    }
}

/// Extracts the verified claims that [`crate::middleware::JwtMiddlewareService`] placed in the request
/// extensions. Routes outside an authenticated scope get a 401.
impl FromRequest for JwtClaims {
    type Error = crate::errors::ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req
            .extensions()
            .get::<JwtClaims>()
            .cloned()
            .ok_or(crate::errors::ServerError::CouldNotDeserializeAuthToken);
        ready(claims)
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::default();
        Self { key, validation }
    }

    pub fn decode(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

/// Signs access tokens. In production the marketplace backend does this; the server only keeps an issuer
/// around for tests and local tooling.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, sub: UserId, roles: Roles, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or_else(|| Duration::hours(24));
        let claims = JwtClaims::new(sub, roles, Utc::now() + duration);
        encode(&Header::default(), &claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}
