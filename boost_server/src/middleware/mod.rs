mod acl;
mod hmac;
mod jwt;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, SignaturePolicy, PAYGATE_HMAC_HEADER};
pub use jwt::{JwtMiddlewareFactory, JwtMiddlewareService};
