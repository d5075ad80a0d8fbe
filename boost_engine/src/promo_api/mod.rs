//! The public APIs of the promotion engine.
//!
//! [`SettlementApi`] drives every mutating flow: boost purchases, settlement callbacks, ticker claims,
//! expiry sweeps and the admin override. [`CatalogApi`] is the read-only companion.

mod catalog_api;
mod settlement_api;

pub use catalog_api::CatalogApi;
pub use settlement_api::SettlementApi;
