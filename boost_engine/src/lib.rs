//! Boost Promotion Engine
//!
//! The engine holds the core logic of the marketplace's paid-promotion subsystem: the package catalog, the
//! payment ledger, settlement processing, the singleton ticker slot and the expiry sweep. It is
//! server-agnostic; the HTTP surface lives in a separate crate.
//!
//! The library is divided into two main sections:
//! 1. Database management ([`mod@sqlite`]). SQLite is the supported backend. You should never need to query
//!    the database directly; use the public APIs instead. The exception is the data types stored in the
//!    database, which are defined in [`mod@db_types`] and are public.
//! 2. The engine public API ([`SettlementApi`] and [`CatalogApi`]). These are generic over the backend
//!    traits ([`PromoGatewayDatabase`], [`CatalogManagement`]) and carry all the business rules: who may
//!    buy a boost, what a settlement callback may do, how the ticker changes hands and when promotions
//!    lapse.
//!
//! The engine also emits events ([`mod@events`]) when a listing is boosted or the ticker slot changes
//! hands. A small channel-based framework lets applications hook into these without sitting on the
//! settlement code path.
pub mod db_types;
pub mod events;
mod promo_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use promo_api::{CatalogApi, SettlementApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogApiError,
    CatalogManagement,
    FinalizeResult,
    PromoGatewayDatabase,
    PromoGatewayError,
    SettlementEffect,
    SettlementOutcome,
    SettlementStatus,
    SweepResult,
};
