use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{Ticket, TicketResult, WalletTransaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    TicketResult,
    SubscriptionExpiring,
    SubscriptionExpired,
}

/// A user-facing notification. Delivery (push, in-app feed, websockets) is up to whoever handles the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    /// Structured payload for clients, e.g. `{"ticket_id": 4, "result": "Win"}`
    pub data: Value,
}

impl Notification {
    pub fn new<S: Into<String>>(
        user_id: i64,
        notification_type: NotificationType,
        title: S,
        message: S,
        data: Value,
    ) -> Self {
        Self { user_id, notification_type, title: title.into(), message: message.into(), data }
    }
}

/// Emitted once for every ticket that a settlement run moves to `Finished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSettledEvent {
    pub ticket: Ticket,
    /// The `Win` ledger entries written as part of the settlement. Empty for a losing ticket.
    pub postings: Vec<WalletTransaction>,
}

impl TicketSettledEvent {
    pub fn new(ticket: Ticket, postings: Vec<WalletTransaction>) -> Self {
        Self { ticket, postings }
    }

    pub fn result(&self) -> TicketResult {
        self.ticket.result
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    TicketSettled(TicketSettledEvent),
    Notification(Notification),
}
