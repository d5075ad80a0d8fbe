use serde::{Deserialize, Serialize};

use crate::db_types::{Listing, TickerSlot, Transaction, UserId};

/// A settlement granted a timed boost to a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingBoostedEvent {
    pub listing: Listing,
    pub transaction: Transaction,
}

impl ListingBoostedEvent {
    pub fn new(listing: Listing, transaction: Transaction) -> Self {
        Self { listing, transaction }
    }
}

/// The ticker slot changed hands and a previous occupant lost it.
///
/// The slot keeps no history, so this event (and the best-effort notification row written alongside it)
/// is the only record of who was dethroned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerDethronedEvent {
    pub previous_owner: UserId,
    pub previous_listing_id: Option<i64>,
    pub slot: TickerSlot,
}
