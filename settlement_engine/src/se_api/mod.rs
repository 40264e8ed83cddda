//! # Settlement engine public API
//!
//! The `se_api` module exposes one API per periodic job. Each API is created by supplying a backend that implements
//! the traits it needs, plus whatever collaborators the job talks to. Every run takes the current time as an argument
//! and returns a report describing what it did.
//!
//! * [`locking_api`] closes tickets once their first match has started.
//! * [`score_sync_api`] pulls results from the score provider and reconciles match states.
//! * [`settlement_api`] resolves locked tickets, pays out winners and notifies buyers and subscribers.
//! * [`subscription_api`] sends expiry warnings and expires lapsed subscriptions.
//!
//! ```rust,ignore
//! use settlement_engine::{SettlementApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = SettlementApi::new(db, producers);
//! let report = api.settle_locked_tickets(Utc::now()).await?;
//! ```
pub mod errors;
pub mod locking_api;
pub mod notifier;
pub mod report_objects;
pub mod score_sync_api;
pub mod settlement_api;
pub mod subscription_api;
