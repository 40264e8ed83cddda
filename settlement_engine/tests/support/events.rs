use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use settlement_engine::events::{EventHandlers, EventHooks, EventProducers, Notification, TicketSettledEvent};
use tokio::task::JoinHandle;

/// Collects everything the engine publishes, so tests can assert on it once the handlers have drained.
#[derive(Clone, Default)]
pub struct CapturedEvents {
    pub notifications: Arc<Mutex<Vec<Notification>>>,
    pub settled: Arc<Mutex<Vec<TicketSettledEvent>>>,
}

impl CapturedEvents {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn settled(&self) -> Vec<TicketSettledEvent> {
        self.settled.lock().unwrap().clone()
    }

    /// The sorted ids of users that received a notification
    pub fn recipients(&self) -> Vec<i64> {
        let mut ids = self.notifications().iter().map(|n| n.user_id).collect::<Vec<_>>();
        ids.sort();
        ids
    }
}

/// Starts capturing hooks. Drop every holder of the returned producers, then call [`drain`] before asserting.
pub fn capture_events() -> (EventProducers, Vec<JoinHandle<()>>, CapturedEvents) {
    let captured = CapturedEvents::default();
    let mut hooks = EventHooks::default();
    let sink = captured.notifications.clone();
    hooks.on_notification(move |n| {
        let sink = sink.clone();
        Box::pin(async move {
            sink.lock().unwrap().push(n);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let sink = captured.settled.clone();
    hooks.on_ticket_settled(move |ev| {
        let sink = sink.clone();
        Box::pin(async move {
            sink.lock().unwrap().push(ev);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(32, hooks);
    let producers = handlers.producers();
    let tasks = handlers.start_handlers();
    (producers, tasks, captured)
}

pub async fn drain(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        task.await.expect("Event handler panicked");
    }
}
