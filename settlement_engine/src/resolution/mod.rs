//! Pure decision logic: market resolution, ticket verdicts and match state transitions.
//!
//! Nothing in here touches storage or the clock, which keeps every rule testable in isolation.
mod market_rules;
mod match_state;
mod ticket_verdict;

pub use market_rules::{is_selection_correct, resolve_selection, FinalScore, MarketType};
pub use match_state::next_match_state;
pub use ticket_verdict::{evaluate_ticket, PendingReason, TicketVerdict};
