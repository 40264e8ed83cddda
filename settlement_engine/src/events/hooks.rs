use std::{future::Future, pin::Pin, sync::Arc};

use tokio::task::JoinHandle;

use crate::events::{EventHandler, EventProducer, Handler, Notification, TicketSettledEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub ticket_settled_producer: Vec<EventProducer<TicketSettledEvent>>,
    pub notification_producer: Vec<EventProducer<Notification>>,
}

pub struct EventHandlers {
    pub on_ticket_settled: Option<EventHandler<TicketSettledEvent>>,
    pub on_notification: Option<EventHandler<Notification>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_ticket_settled = hooks.on_ticket_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_notification = hooks.on_notification.map(|f| EventHandler::new(buffer_size, f));
        Self { on_ticket_settled, on_notification }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_ticket_settled {
            result.ticket_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_notification {
            result.notification_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns every configured handler. Each returned task finishes once all of its producers have been dropped and
    /// its queue is drained.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(handler) = self.on_ticket_settled {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_notification {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        tasks
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_ticket_settled: Option<Handler<TicketSettledEvent>>,
    pub on_notification: Option<Handler<Notification>>,
}

impl EventHooks {
    pub fn on_ticket_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TicketSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_ticket_settled = Some(Arc::new(f));
        self
    }

    pub fn on_notification<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(Notification) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notification = Some(Arc::new(f));
        self
    }
}
