use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{BookingConfirmedEvent, EventHandler, EventProducer, Handler, HoldsExpiredEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub booking_confirmed_producer: Vec<EventProducer<BookingConfirmedEvent>>,
    pub holds_expired_producer: Vec<EventProducer<HoldsExpiredEvent>>,
}

pub struct EventHandlers {
    pub on_booking_confirmed: Option<EventHandler<BookingConfirmedEvent>>,
    pub on_holds_expired: Option<EventHandler<HoldsExpiredEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_booking_confirmed = hooks.on_booking_confirmed.map(|f| EventHandler::new(buffer_size, f));
        let on_holds_expired = hooks.on_holds_expired.map(|f| EventHandler::new(buffer_size, f));
        Self { on_booking_confirmed, on_holds_expired }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_booking_confirmed {
            result.booking_confirmed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_holds_expired {
            result.holds_expired_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_booking_confirmed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_holds_expired {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_booking_confirmed: Option<Handler<BookingConfirmedEvent>>,
    pub on_holds_expired: Option<Handler<HoldsExpiredEvent>>,
}

impl EventHooks {
    pub fn on_booking_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BookingConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_booking_confirmed = Some(Arc::new(f));
        self
    }

    pub fn on_holds_expired<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(HoldsExpiredEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_holds_expired = Some(Arc::new(f));
        self
    }
}
