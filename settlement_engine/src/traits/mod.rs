//! # Settlement engine backends and collaborators
//!
//! This module defines the interface contracts that the engine jobs depend on.
//!
//! ## Repositories
//! * [`MatchManagement`] owns match records and applies provider scores to them.
//! * [`TicketManagement`] owns tickets, their immutable selections and purchases.
//! * [`LedgerManagement`] gives access to wallets and the append-only wallet ledger.
//! * [`SubscriptionManagement`] owns subscriptions and their one-shot notification flags.
//! * [`UserManagement`] resolves user contact details.
//! * [`SettlementDatabase`] ties the repositories together and adds atomic ticket settlement.
//!
//! ## External collaborators
//! * [`ScoreSource`] fetches results from a score provider, one league at a time.
//! * [`SubscriptionMailer`] sends subscription lifecycle emails.
mod data_objects;
mod ledger_management;
mod mailer;
mod match_management;
mod score_source;
mod settlement_database;
mod subscription_management;
mod ticket_management;
mod user_management;

pub use data_objects::{Payout, ScoreUpdateOutcome, SettlementOutcome, SubscriptionContact, TicketSettlement};
pub use ledger_management::{LedgerApiError, LedgerManagement};
pub use mailer::{MailerError, SubscriptionMailer};
pub use match_management::{MatchApiError, MatchManagement};
pub use score_source::{ProviderScore, QuotaSignal, ScoreBatch, ScoreSource, ScoreSourceError};
pub use settlement_database::{SettlementDatabase, SettlementDatabaseError};
pub use subscription_management::{SubscriptionApiError, SubscriptionManagement};
pub use ticket_management::{TicketApiError, TicketManagement};
pub use user_management::{UserApiError, UserManagement};
