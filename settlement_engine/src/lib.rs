//! # Tipster marketplace settlement engine
//!
//! The engine keeps the marketplace's betting tickets honest once they are published:
//!
//! * Tickets are locked when their first match kicks off ([`TicketLockingApi`]).
//! * Match results are pulled from an external score provider ([`ScoreSyncApi`]).
//! * Locked tickets are resolved and winners are paid ([`SettlementApi`]).
//! * Subscribers are warned before their subscriptions run out, and lapsed subscriptions are expired
//!   ([`SubscriptionExpiryApi`]).
//!
//! Every job is safe to run repeatedly or concurrently. State changes are guarded by conditional updates, so a job
//! that runs twice does the work once.
//!
//! Storage is abstracted behind the traits in [`traits`]. A SQLite implementation is provided in [`sqlite`].
pub mod db_types;
pub mod events;
pub mod resolution;
pub mod se_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use se_api::{
    errors::SettlementError,
    locking_api::TicketLockingApi,
    notifier::Notifier,
    report_objects::{
        LeagueFailure,
        LockingResult,
        ScoreSyncReport,
        SettlementReport,
        SubscriptionSweepResult,
        TicketSettlementStatus,
    },
    score_sync_api::{ScoreSyncApi, ScoreSyncOptions},
    settlement_api::{payout_for, SettlementApi},
    subscription_api::SubscriptionExpiryApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{SettlementDatabase, SettlementDatabaseError};
