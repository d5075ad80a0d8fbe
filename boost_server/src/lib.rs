//! # Boost Promotion Server
//! This crate hosts the HTTP surface of the paid-promotion subsystem. It is responsible for:
//! * Authenticated endpoints for browsing the catalog, buying boosts and claiming the ticker slot.
//! * Receiving (HMAC-signed) settlement callbacks from the mobile-money aggregator.
//! * Admin endpoints for the expiry override and on-demand sweeps.
//! * The background worker that demotes lapsed promotions.
//!
//! ## Configuration
//! The server is configured via `BPS_*` environment variables. See the [config] module for details.
//!
//! All business rules live in the `boost_engine` crate; this crate only maps HTTP onto the engine APIs.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
