use std::collections::BTreeSet;

use log::*;
use serde_json::Value;

use crate::events::{EventProducers, Notification, NotificationType};

/// Fire-and-forget delivery of user notifications through the event hooks.
///
/// With no notification hook attached, notifications are dropped after a trace message.
#[derive(Clone, Default)]
pub struct Notifier {
    producers: EventProducers,
}

impl Notifier {
    pub fn new(producers: EventProducers) -> Self {
        Self { producers }
    }

    pub async fn notify_user(
        &self,
        user_id: i64,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        data: Value,
    ) {
        if self.producers.notification_producer.is_empty() {
            trace!("📬️ No notification hook is attached. Dropping {notification_type:?} for user #{user_id}");
            return;
        }
        let notification = Notification::new(user_id, notification_type, title, message, data);
        for producer in &self.producers.notification_producer {
            producer.publish_event(notification.clone()).await;
        }
    }

    /// Notifies each distinct user once, however many times they appear in `user_ids`.
    /// Returns the number of distinct recipients.
    pub async fn notify_many(
        &self,
        user_ids: &[i64],
        notification_type: NotificationType,
        title: &str,
        message: &str,
        data: Value,
    ) -> usize {
        let recipients = user_ids.iter().copied().collect::<BTreeSet<_>>();
        for user_id in &recipients {
            self.notify_user(*user_id, notification_type, title, message, data.clone()).await;
        }
        debug!("📬️ Sent {notification_type:?} notification to {} users", recipients.len());
        recipients.len()
    }
}

#[cfg(test)]
mod test {
    use std::{
        future::Future,
        pin::Pin,
        sync::{Arc, Mutex},
    };

    use serde_json::json;

    use super::*;
    use crate::events::{EventHandlers, EventHooks};

    #[tokio::test]
    async fn notify_many_deduplicates_recipients() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let mut hooks = EventHooks::default();
        hooks.on_notification(move |n: Notification| {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().unwrap().push(n.user_id);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let handlers = EventHandlers::new(8, hooks);
        let notifier = Notifier::new(handlers.producers());
        let tasks = handlers.start_handlers();

        let count =
            notifier.notify_many(&[3, 1, 3, 2, 1], NotificationType::TicketResult, "Result", "Won", json!({})).await;
        drop(notifier);
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(count, 3);
        let mut ids = received.lock().unwrap().clone();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn notifications_without_hooks_are_dropped() {
        let notifier = Notifier::default();
        let count = notifier.notify_many(&[1], NotificationType::SubscriptionExpired, "t", "m", Value::Null).await;
        assert_eq!(count, 1);
    }
}
