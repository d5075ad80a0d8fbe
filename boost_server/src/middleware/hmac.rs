//! Signature middleware for the settlement webhook.
//!
//! The aggregator signs every callback: the HMAC-SHA256 of the raw request body under the shared secret,
//! base64-encoded, in the `x-paygate-hmac-sha256` header. This middleware verifies the signature before
//! the handler ever parses the body, and re-injects the consumed payload so extraction downstream works as
//! usual. Wrap the whole webhook scope with it.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use bps_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::{config::PayGateConfig, helpers::calculate_hmac};

/// The header the aggregator uses to carry the signature of the callback body.
pub const PAYGATE_HMAC_HEADER: &str = "x-paygate-hmac-sha256";

/// The signature scheme of a callback endpoint: which header carries the signature, the shared secret, and
/// whether verification is enforced at all.
#[derive(Clone)]
pub struct SignaturePolicy {
    header: &'static str,
    secret: Secret<String>,
    enforced: bool,
}

impl SignaturePolicy {
    pub fn for_paygate(config: &PayGateConfig) -> Self {
        Self { header: PAYGATE_HMAC_HEADER, secret: config.hmac_secret.clone(), enforced: config.hmac_checks }
    }

    fn verify(&self, presented: Option<&str>, body: &[u8]) -> Result<(), Error> {
        let expected = calculate_hmac(self.secret.reveal(), body);
        match presented {
            Some(signature) if signature == expected => Ok(()),
            Some(_) => {
                warn!("🔐️ Callback signature does not match the body. Denying access.");
                Err(ErrorForbidden("Invalid HMAC signature."))
            },
            None => {
                warn!("🔐️ Callback arrived without a signature header. Denying access.");
                Err(ErrorForbidden("No HMAC signature found."))
            },
        }
    }
}

pub struct HmacMiddlewareFactory {
    policy: SignaturePolicy,
}

impl HmacMiddlewareFactory {
    pub fn new(policy: SignaturePolicy) -> Self {
        HmacMiddlewareFactory { policy }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { policy: self.policy.clone(), service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    policy: SignaturePolicy,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let policy = self.policy.clone();
        Box::pin(async move {
            if !policy.enforced {
                trace!("🔐️ Signature checks are disabled. Passing the request through.");
                return service.call(req).await;
            }
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Could not buffer the request body for signature verification: {e:?}");
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let presented = req.headers().get(policy.header).and_then(|v| v.to_str().ok()).map(str::to_string);
            policy.verify(presented.as_deref(), &body)?;
            trace!("🔐️ Signature check for request ✅️");
            req.set_payload(bytes_to_payload(body));
            service.call(req).await
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
