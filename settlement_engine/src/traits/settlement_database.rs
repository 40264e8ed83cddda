use thiserror::Error;

use crate::traits::{
    data_objects::{SettlementOutcome, TicketSettlement},
    LedgerApiError,
    LedgerManagement,
    MatchManagement,
    SubscriptionManagement,
    TicketApiError,
    TicketManagement,
    UserManagement,
};

#[derive(Debug, Clone, Error)]
pub enum SettlementDatabaseError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Ticket {0} does not exist")]
    TicketNotFound(i64),
    #[error("Cannot settle ticket {0} with a pending result")]
    PendingResult(i64),
    #[error(transparent)]
    Ticket(#[from] TicketApiError),
    #[error(transparent)]
    Ledger(#[from] LedgerApiError),
}

impl From<sqlx::Error> for SettlementDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        SettlementDatabaseError::DatabaseError(e.to_string())
    }
}

/// The highest level of behaviour for settlement engine backends.
///
/// Beyond the repository traits, a backend must be able to settle a ticket in one atomic step:
/// * Move the ticket from `Locked` to `Finished` with its result, only if it is still `Locked`.
/// * For a win, append one `Win` ledger entry per payout and credit the matching wallet.
///
/// If the ticket is no longer `Locked`, nothing is written and [`SettlementOutcome::AlreadySettled`] is returned.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase:
    Clone + MatchManagement + TicketManagement + LedgerManagement + SubscriptionManagement + UserManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    async fn settle_ticket(&self, settlement: TicketSettlement) -> Result<SettlementOutcome, SettlementDatabaseError>;
}
