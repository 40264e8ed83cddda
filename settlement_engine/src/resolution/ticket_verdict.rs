use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Match, Selection, TicketResult},
    resolution::market_rules::{is_selection_correct, FinalScore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingReason {
    /// A selection refers to a match that is no longer in the repository.
    MissingMatch(i64),
    /// A selection's match has not finished yet.
    MatchNotFinished(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketVerdict {
    /// The ticket cannot be settled yet and stays `Locked`.
    Pending(PendingReason),
    Resolved(TicketResult),
}

/// Decides the verdict for a ticket from its selections and the matches they refer to.
///
/// * A ticket with no selections loses.
/// * If any match is missing or unfinished, the ticket stays pending.
/// * A ticket wins only if every selection is correct. A finished match without a score makes its selection
///   incorrect.
pub fn evaluate_ticket(selections: &[Selection], matches: &HashMap<i64, Match>) -> TicketVerdict {
    if selections.is_empty() {
        return TicketVerdict::Resolved(TicketResult::Lose);
    }
    for selection in selections {
        match matches.get(&selection.match_id) {
            None => return TicketVerdict::Pending(PendingReason::MissingMatch(selection.match_id)),
            Some(m) if !m.is_finished() => return TicketVerdict::Pending(PendingReason::MatchNotFinished(m.id)),
            Some(_) => {},
        }
    }
    let all_correct = selections.iter().all(|s| {
        let Some(m) = matches.get(&s.match_id) else {
            return false;
        };
        match m.final_score() {
            Some((home, away)) => {
                let score = FinalScore { home_team: &m.home_team, away_team: &m.away_team, home, away };
                is_selection_correct(&s.market_type, &s.label, &score)
            },
            None => {
                warn!("🧾️ Match #{} is finished but has no score. Selection #{} counts as lost.", m.id, s.id);
                false
            },
        }
    });
    let result = if all_correct { TicketResult::Win } else { TicketResult::Lose };
    TicketVerdict::Resolved(result)
}
