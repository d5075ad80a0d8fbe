//! Access control list middleware.
//!
//! Can be placed on any route inside an authenticated scope. It checks the claims that the JWT middleware
//! stored in the request extensions against the required roles for the route, and returns 403 Forbidden if
//! any are missing.
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorInternalServerError},
    Error,
    HttpMessage,
};
use boost_engine::db_types::{Role, Roles};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{debug, warn};

use crate::auth::JwtClaims;

pub struct AclMiddlewareFactory {
    required_roles: Roles,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Roles,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let required = self.required_roles.clone();
        Box::pin(async move {
            let granted = match req.extensions().get::<JwtClaims>() {
                Some(claims) => claims.roles.clone(),
                None => {
                    // Only reachable if the route was mounted outside the JWT scope.
                    warn!("🔐️ No verified claims in the request extensions");
                    return Err(ErrorInternalServerError("No access token claims found"));
                },
            };
            let missing = required.iter().filter(|role| !granted.contains(role)).collect::<Vec<&Role>>();
            if missing.is_empty() {
                service.call(req).await
            } else {
                debug!("🔐️ Request denied. Missing roles: {missing:?}");
                Err(ErrorForbidden("Insufficient permissions"))
            }
        })
    }
}
