use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, ListingBoostedEvent, TickerDethronedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub listing_boosted_producer: Vec<EventProducer<ListingBoostedEvent>>,
    pub ticker_dethroned_producer: Vec<EventProducer<TickerDethronedEvent>>,
}

pub struct EventHandlers {
    pub on_listing_boosted: Option<EventHandler<ListingBoostedEvent>>,
    pub on_ticker_dethroned: Option<EventHandler<TickerDethronedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_listing_boosted = hooks.on_listing_boosted.map(|f| EventHandler::new(buffer_size, f));
        let on_ticker_dethroned = hooks.on_ticker_dethroned.map(|f| EventHandler::new(buffer_size, f));
        Self { on_listing_boosted, on_ticker_dethroned }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_listing_boosted {
            result.listing_boosted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_ticker_dethroned {
            result.ticker_dethroned_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_listing_boosted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_ticker_dethroned {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_listing_boosted: Option<Handler<ListingBoostedEvent>>,
    pub on_ticker_dethroned: Option<Handler<TickerDethronedEvent>>,
}

impl EventHooks {
    pub fn on_listing_boosted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ListingBoostedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_listing_boosted = Some(Arc::new(f));
        self
    }

    pub fn on_ticker_dethroned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TickerDethronedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_ticker_dethroned = Some(Arc::new(f));
        self
    }
}
