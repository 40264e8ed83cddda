use serde::{Deserialize, Serialize};

use crate::{
    db_types::TicketResult,
    resolution::PendingReason,
    traits::QuotaSignal,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockingResult {
    /// The tickets this run moved from `Open` to `Locked`
    pub locked: Vec<i64>,
}

impl LockingResult {
    pub fn count(&self) -> usize {
        self.locked.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueFailure {
    pub league_key: String,
    pub reason: String,
    pub rate_limited: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSyncReport {
    /// False when provider polling was switched off and only local reconciliation ran
    pub provider_enabled: bool,
    pub leagues_polled: Vec<String>,
    pub league_failures: Vec<LeagueFailure>,
    pub scores_received: usize,
    pub matches_updated: Vec<i64>,
    pub unchanged: usize,
    pub unknown_matches: usize,
    pub already_finished: usize,
    /// Per-match write failures. These never abort the run.
    pub update_errors: usize,
    pub marked_live: Vec<i64>,
    pub finished_locally: Vec<i64>,
    /// The lowest remaining request quota reported by the provider during the run
    pub lowest_quota: Option<QuotaSignal>,
}

impl ScoreSyncReport {
    pub fn record_quota(&mut self, quota: QuotaSignal) {
        let Some(remaining) = quota.remaining else {
            if self.lowest_quota.is_none() {
                self.lowest_quota = Some(quota);
            }
            return;
        };
        let lower = match self.lowest_quota.and_then(|q| q.remaining) {
            Some(current) => remaining < current,
            None => true,
        };
        if lower {
            self.lowest_quota = Some(quota);
        }
    }

    pub fn was_rate_limited(&self) -> bool {
        self.league_failures.iter().any(|f| f.rate_limited)
    }
}

/// What happened to a single locked ticket during a settlement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketSettlementStatus {
    /// The ticket cannot be resolved yet and remains `Locked`.
    Pending(PendingReason),
    Settled { result: TicketResult, payouts: usize },
    /// Another run got there first.
    AlreadySettled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub examined: usize,
    pub won: Vec<i64>,
    pub lost: Vec<i64>,
    pub pending: Vec<i64>,
    pub already_settled: Vec<i64>,
    /// Tickets whose processing failed. They stay `Locked` and are retried on the next run.
    pub failed: Vec<i64>,
    pub payouts: usize,
}

impl SettlementReport {
    pub fn settled(&self) -> usize {
        self.won.len() + self.lost.len()
    }

    pub(crate) fn record(&mut self, ticket_id: i64, status: TicketSettlementStatus) {
        match status {
            TicketSettlementStatus::Pending(_) => self.pending.push(ticket_id),
            TicketSettlementStatus::Settled { result: TicketResult::Win, payouts } => {
                self.won.push(ticket_id);
                self.payouts += payouts;
            },
            TicketSettlementStatus::Settled { .. } => self.lost.push(ticket_id),
            TicketSettlementStatus::AlreadySettled => self.already_settled.push(ticket_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSweepResult {
    pub j3_warnings: Vec<i64>,
    pub j1_warnings: Vec<i64>,
    pub expired: Vec<i64>,
    pub expiry_notices: Vec<i64>,
    pub emails_sent: usize,
    pub email_failures: usize,
    /// Subscriptions whose processing failed. Their flags were not claimed, so the next sweep retries them.
    pub failed: Vec<i64>,
}

impl SubscriptionSweepResult {
    pub fn notifications(&self) -> usize {
        self.j3_warnings.len() + self.j1_warnings.len() + self.expiry_notices.len()
    }
}
