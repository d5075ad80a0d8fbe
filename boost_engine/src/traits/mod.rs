//! Database backend contracts for the promotion gateway.
//!
//! The engine is backend-agnostic: all storage behaviour is defined by the traits in this module, and the
//! public APIs ([`crate::SettlementApi`], [`crate::CatalogApi`]) are generic over them.
//!
//! * [`PromoGatewayDatabase`] defines the mutating flows: ledger writes, settlement finalization, boost
//!   application, ticker reassignment, expiry sweeps and the admin override. Implementations must make each
//!   method atomic with respect to concurrent callers (single conditional statements, or one database
//!   transaction per call) — callers never compose multi-step invariants out of these methods.
//! * [`CatalogManagement`] provides the read-only surface: the package catalog, listings, transactions and
//!   the current ticker slot.

mod catalog_management;
mod data_objects;
mod promo_gateway_database;

pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use data_objects::{FinalizeResult, SettlementEffect, SettlementOutcome, SettlementStatus, SweepResult};
pub use promo_gateway_database::{PromoGatewayDatabase, PromoGatewayError};
