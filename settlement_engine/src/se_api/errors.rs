use thiserror::Error;

use crate::traits::{
    LedgerApiError,
    MatchApiError,
    ScoreSourceError,
    SettlementDatabaseError,
    SubscriptionApiError,
    TicketApiError,
    UserApiError,
};

/// Errors surfaced by the engine APIs. Per-entity failures inside a run are logged and counted instead, so these
/// only escape when a whole run cannot proceed.
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Ticket repository error: {0}")]
    Ticket(#[from] TicketApiError),
    #[error("Match repository error: {0}")]
    Match(#[from] MatchApiError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerApiError),
    #[error("Subscription repository error: {0}")]
    Subscription(#[from] SubscriptionApiError),
    #[error("User repository error: {0}")]
    User(#[from] UserApiError),
    #[error("Settlement could not be committed: {0}")]
    Database(#[from] SettlementDatabaseError),
    #[error("Score provider error: {0}")]
    ScoreSource(#[from] ScoreSourceError),
    #[error("Could not compute the payout for ticket {ticket_id}: {reason}")]
    PayoutError { ticket_id: i64, reason: String },
}
