use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewTicket, NewTicketPurchase, Selection, Ticket, TicketPurchase, TicketStatus};

#[derive(Debug, Clone, Error)]
pub enum TicketApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Ticket {0} does not exist")]
    TicketNotFound(i64),
    #[error("A ticket must contain at least one selection")]
    NoSelections,
    #[error("Invalid odds: {0}")]
    InvalidOdds(String),
    #[error("User {buyer_id} has already bought ticket {ticket_id}")]
    DuplicatePurchase { ticket_id: i64, buyer_id: i64 },
    #[error("Ticket {0} is no longer on sale")]
    NotOnSale(i64),
}

impl From<sqlx::Error> for TicketApiError {
    fn from(e: sqlx::Error) -> Self {
        TicketApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait TicketManagement {
    /// Stores a new ticket and its selections atomically. The average odds are computed from the selections.
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, TicketApiError>;

    /// Fetches a ticket by id. Soft-deleted tickets are returned too.
    async fn fetch_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, TicketApiError>;

    /// The selections of the ticket, in the order they were added.
    async fn fetch_selections(&self, ticket_id: i64) -> Result<Vec<Selection>, TicketApiError>;

    /// All non-deleted tickets with the given status, oldest first.
    async fn fetch_tickets_with_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, TicketApiError>;

    /// Atomically locks every open, non-deleted ticket whose earliest match has started.
    /// Returns the ids of the tickets that this call locked.
    async fn lock_started_tickets(&self, now: DateTime<Utc>) -> Result<Vec<i64>, TicketApiError>;

    /// Soft-deletes a ticket. Returns false if the ticket was already deleted or does not exist.
    async fn soft_delete_ticket(&self, ticket_id: i64) -> Result<bool, TicketApiError>;

    /// Records a purchase. Only open tickets can be bought, and at most once per buyer.
    async fn insert_purchase(&self, purchase: NewTicketPurchase) -> Result<TicketPurchase, TicketApiError>;

    async fn fetch_purchases(&self, ticket_id: i64) -> Result<Vec<TicketPurchase>, TicketApiError>;
}
