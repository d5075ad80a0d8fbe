//! Async event hooks for the promotion gateway.
//!
//! Settlement flows emit events (a listing was boosted, the ticker changed hands) that other parts of the
//! application can subscribe to without being on the settlement code path. Delivery is best-effort and
//! fire-and-forget: a slow or failing subscriber never blocks or fails a settlement.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{ListingBoostedEvent, TickerDethronedEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
