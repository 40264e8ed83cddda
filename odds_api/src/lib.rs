//! Client for the external odds/scores provider.
//!
//! The provider is quota limited: every response carries request-usage headers, which are surfaced as [`QuotaUsage`]
//! alongside the data so that callers can log or alert on them.
mod api;
mod config;
mod error;

mod data_objects;
pub mod helpers;

pub use api::OddsApi;
pub use config::OddsApiConfig;
pub use data_objects::{QuotaUsage, ScoreEvent, ScoresResponse, TeamScore};
pub use error::OddsApiError;
