use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tipster_common::Money;

use crate::db_types::{Match, Subscription, Ticket, TicketResult, WalletTransaction};

/// The outcome of applying one provider score to the match repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreUpdateOutcome {
    /// The match changed. Carries the updated record.
    Updated(Match),
    /// The provider reported exactly what we already had.
    Unchanged,
    /// The match was already finished and is never touched again.
    AlreadyFinished,
    /// No match with the provider's identifier exists locally.
    UnknownMatch,
}

/// A single payout owed to a buyer of a winning ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub user_id: i64,
    pub amount: Money,
}

/// Everything needed to settle one ticket in a single atomic step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSettlement {
    pub ticket_id: i64,
    pub result: TicketResult,
    /// Only applied when `result` is `Win`
    pub payouts: Vec<Payout>,
}

impl TicketSettlement {
    pub fn losing(ticket_id: i64) -> Self {
        Self { ticket_id, result: TicketResult::Lose, payouts: Vec::new() }
    }

    pub fn winning(ticket_id: i64, payouts: Vec<Payout>) -> Self {
        Self { ticket_id, result: TicketResult::Win, payouts }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    /// This call moved the ticket from `Locked` to `Finished`.
    Settled { ticket: Ticket, postings: Vec<WalletTransaction> },
    /// Someone else settled the ticket first. Nothing was written.
    AlreadySettled,
}

/// A subscription, along with the contact details needed to notify the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SubscriptionContact {
    #[sqlx(flatten)]
    pub subscription: Subscription,
    pub subscriber_username: String,
    pub subscriber_email: String,
    pub tipster_username: String,
}
