use futures::future::BoxFuture;
use log::*;
use settlement_engine::events::{EventHandlers, EventHooks, Notification, TicketSettledEvent};
use tipster_common::{Money, DEFAULT_CURRENCY_CODE};

/// Assigns the server's event handlers.
///
/// 1. Notification - Delivery to devices and the in-app feed is handled outside this server, so notifications are
///    logged here.
/// 2. TicketSettledEvent - A summary of the settlement and the payouts posted for it.
pub fn create_event_handlers(buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_notification(|n: Notification| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            info!(
                "📬️ [{:?}] to user #{}: {} {} {}",
                n.notification_type, n.user_id, n.title, n.message, n.data
            );
        })
    });
    hooks.on_ticket_settled(|ev: TicketSettledEvent| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let total = ev.postings.iter().map(|p| p.amount).sum::<Money>();
            info!(
                "📬️ Ticket #{} \"{}\" settled as {}. {} payouts totalling {total} {DEFAULT_CURRENCY_CODE}",
                ev.ticket.id,
                ev.ticket.title,
                ev.result(),
                ev.postings.len()
            );
        })
    });
    EventHandlers::new(buffer_size, hooks)
}
