//! Access-token middleware.
//!
//! Wraps a scope so that every request in it must carry a valid JWT in the `bps_access_token` header. The
//! verified claims are placed in the request extensions, where the [`crate::auth::JwtClaims`] extractor
//! and the ACL middleware pick them up.
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{debug, warn};

use crate::{auth::{TokenVerifier, AUTH_HEADER}, errors::ServerError};

pub struct JwtMiddlewareFactory {
    verifier: TokenVerifier,
}

impl JwtMiddlewareFactory {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { verifier: self.verifier.clone(), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    verifier: TokenVerifier,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        Box::pin(async move {
            let token = req
                .headers()
                .get(AUTH_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or(ServerError::CouldNotDeserializeAuthToken)?;
            let claims = verifier.decode(token).map_err(|e| {
                warn!("🔑️ Rejecting request with invalid access token. {e}");
                ServerError::AuthenticationError(e)
            })?;
            debug!("🔑️ Request authenticated for {} with roles {:?}", claims.sub, claims.roles);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
