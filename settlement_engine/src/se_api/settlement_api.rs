//! Settles locked tickets once every match they depend on is over.
//!
//! Each ticket is handled on its own: a failure while settling one ticket is logged and counted, and the rest of the
//! run carries on. The ticket stays `Locked` and the next run retries it.
//!
//! All writes for a ticket (status, result and payouts) are committed in a single transaction that only goes ahead
//! if the ticket is still `Locked`. Notifications are sent after the commit, and only by the run that performed it.
use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use log::*;
use serde_json::json;

use crate::{
    db_types::{Ticket, TicketPurchase, TicketResult, TicketStatus},
    events::{EventProducers, NotificationType, TicketSettledEvent},
    resolution::{evaluate_ticket, PendingReason, TicketVerdict},
    se_api::{
        errors::SettlementError,
        notifier::Notifier,
        report_objects::{SettlementReport, TicketSettlementStatus},
    },
    traits::{Payout, SettlementDatabase, SettlementOutcome, TicketSettlement},
};

pub const DEFAULT_SETTLEMENT_CONCURRENCY: usize = 4;

pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
    notifier: Notifier,
    concurrency: usize,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi (concurrency {})", self.concurrency)
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        let notifier = Notifier::new(producers.clone());
        Self { db, producers, notifier, concurrency: DEFAULT_SETTLEMENT_CONCURRENCY }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// The payout owed for one purchase of a winning ticket: the price paid multiplied by the ticket's average odds,
/// rounded down to the minor unit.
pub fn payout_for(ticket: &Ticket, purchase: &TicketPurchase) -> Result<Payout, SettlementError> {
    let amount = purchase
        .price_paid
        .multiply_odds(ticket.avg_odds)
        .map_err(|e| SettlementError::PayoutError { ticket_id: ticket.id, reason: e.to_string() })?;
    Ok(Payout { user_id: purchase.buyer_id, amount })
}

impl<B> SettlementApi<B>
where B: SettlementDatabase
{
    /// Tries to settle every locked, non-deleted ticket.
    ///
    /// Only a failure to list the locked tickets aborts the run.
    pub async fn settle_locked_tickets(&self, now: DateTime<Utc>) -> Result<SettlementReport, SettlementError> {
        let tickets = self.db.fetch_tickets_with_status(TicketStatus::Locked).await?;
        let mut report = SettlementReport { examined: tickets.len(), ..Default::default() };
        if tickets.is_empty() {
            trace!("🧾️ No locked tickets to settle");
            return Ok(report);
        }
        debug!("🧾️ Examining {} locked tickets", tickets.len());
        let mut results = stream::iter(tickets)
            .map(|ticket| async move {
                let id = ticket.id;
                (id, self.settle_ticket(&ticket, now).await)
            })
            .buffer_unordered(self.concurrency);
        while let Some((ticket_id, result)) = results.next().await {
            match result {
                Ok(status) => report.record(ticket_id, status),
                Err(e) => {
                    error!("🧾️ Could not settle ticket #{ticket_id}: {e}");
                    report.failed.push(ticket_id);
                },
            }
        }
        info!(
            "🧾️ Settlement run complete. {} won, {} lost, {} pending, {} failed",
            report.won.len(),
            report.lost.len(),
            report.pending.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Settles a single ticket, if all of its matches are over.
    pub async fn settle_ticket(
        &self,
        ticket: &Ticket,
        now: DateTime<Utc>,
    ) -> Result<TicketSettlementStatus, SettlementError> {
        let selections = self.db.fetch_selections(ticket.id).await?;
        let mut match_ids = selections.iter().map(|s| s.match_id).collect::<Vec<_>>();
        match_ids.sort_unstable();
        match_ids.dedup();
        let matches = self.db.fetch_matches(&match_ids).await?.into_iter().map(|m| (m.id, m)).collect::<HashMap<_, _>>();
        let result = match evaluate_ticket(&selections, &matches) {
            TicketVerdict::Pending(reason) => {
                trace!("🧾️ Ticket #{} is not ready to settle: {reason:?}", ticket.id);
                if let PendingReason::MissingMatch(match_id) = reason {
                    warn!("🧾️ Ticket #{} refers to match #{match_id}, which no longer exists", ticket.id);
                }
                return Ok(TicketSettlementStatus::Pending(reason));
            },
            TicketVerdict::Resolved(result) => result,
        };
        let settlement = match result {
            TicketResult::Win => {
                let purchases = self.db.fetch_purchases(ticket.id).await?;
                let payouts = purchases.iter().map(|p| payout_for(ticket, p)).collect::<Result<Vec<_>, _>>()?;
                TicketSettlement::winning(ticket.id, payouts)
            },
            _ => TicketSettlement::losing(ticket.id),
        };
        let (settled, postings) = match self.db.settle_ticket(settlement).await? {
            SettlementOutcome::Settled { ticket, postings } => (ticket, postings),
            SettlementOutcome::AlreadySettled => {
                debug!("🧾️ Ticket #{} was settled by another run", ticket.id);
                return Ok(TicketSettlementStatus::AlreadySettled);
            },
        };
        let payouts = postings.len();
        info!("🧾️ Ticket #{} settled as {result} with {payouts} payouts", settled.id);
        self.notify_ticket_result(&settled, now).await;
        self.call_ticket_settled_hook(TicketSettledEvent::new(settled, postings)).await;
        Ok(TicketSettlementStatus::Settled { result, payouts })
    }

    async fn call_ticket_settled_hook(&self, event: TicketSettledEvent) {
        for emitter in &self.producers.ticket_settled_producer {
            trace!("🧾️ Notifying ticket settled hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    /// Tells every buyer and every active subscriber of the tipster how the ticket went. The commit has already
    /// happened, so failures here are logged and otherwise ignored.
    async fn notify_ticket_result(&self, ticket: &Ticket, now: DateTime<Utc>) {
        let mut recipients = match self.db.fetch_purchases(ticket.id).await {
            Ok(purchases) => purchases.into_iter().map(|p| p.buyer_id).collect::<Vec<_>>(),
            Err(e) => {
                error!("🧾️ Could not load the buyers of ticket #{} for notification: {e}", ticket.id);
                Vec::new()
            },
        };
        match self.db.fetch_active_subscriber_ids(ticket.tipster_id, now).await {
            Ok(ids) => recipients.extend(ids),
            Err(e) => error!("🧾️ Could not load the subscribers of tipster #{}: {e}", ticket.tipster_id),
        }
        let (title, message) = match ticket.result {
            TicketResult::Win => ("Ticket won".to_string(), format!("The ticket \"{}\" is a winner.", ticket.title)),
            _ => ("Ticket lost".to_string(), format!("The ticket \"{}\" did not come in this time.", ticket.title)),
        };
        let data = json!({ "ticket_id": ticket.id, "result": ticket.result.to_string() });
        let sent = self.notifier.notify_many(&recipients, NotificationType::TicketResult, &title, &message, data).await;
        debug!("🧾️ Ticket #{} result sent to {sent} users", ticket.id);
    }
}
