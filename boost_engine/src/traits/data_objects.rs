use serde::{Deserialize, Serialize};

use crate::db_types::{Listing, TickerSlot, Transaction, UserId};

/// The result of a conditional terminal-status write on the ledger.
#[derive(Debug, Clone)]
pub struct FinalizeResult {
    /// The row as it stands after the call.
    pub transaction: Transaction,
    /// `true` if this call performed the transition; `false` if the row was already terminal (a concurrent
    /// or repeated delivery won the race).
    pub applied: bool,
}

/// The decoded verdict carried by a settlement callback from the aggregator.
///
/// `Pending` callbacks are progress notifications; they change nothing and the ledger row stays open for a
/// later, decisive delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Success,
    Failed,
    Pending,
}

/// What a successful settlement did to the marketplace, beyond the ledger write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SettlementEffect {
    /// The settlement was a failure, a duplicate, or an in-flight ("pending") notification; no promotional
    /// effect applies.
    None,
    /// A timed boost was applied to the listing.
    Boosted(Listing),
    /// The ticker slot changed hands. `dethroned` names the previous owner if they lost the slot to
    /// someone else.
    TickerReassigned { slot: TickerSlot, dethroned: Option<UserId> },
    /// The payment is captured (the ledger row is terminally `Success`) but applying the promotional
    /// effect failed. Deliberately not rolled back or retried; an operator must reconcile manually.
    EffectFailed(String),
}

/// The overall outcome of processing one settlement callback.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub transaction: Transaction,
    pub effect: SettlementEffect,
    /// `true` when the callback was a repeat delivery and nothing was changed.
    pub duplicate: bool,
}

/// What one expiry sweep pass did.
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    /// Listings demoted because their promotion window lapsed.
    pub demoted: Vec<Listing>,
    /// Abandoned `Pending` transactions reconciled to `Expired`.
    pub reconciled: Vec<Transaction>,
}

impl SweepResult {
    pub fn total_count(&self) -> usize {
        self.demoted.len() + self.reconciled.len()
    }
}
