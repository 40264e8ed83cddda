use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    db_types::{Match, NewMatch},
    traits::{data_objects::ScoreUpdateOutcome, ProviderScore},
};

#[derive(Debug, Clone, Error)]
pub enum MatchApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A match with external id {0} already exists")]
    DuplicateMatch(String),
    #[error("Match {0} does not exist")]
    MatchNotFound(i64),
}

impl From<sqlx::Error> for MatchApiError {
    fn from(e: sqlx::Error) -> Self {
        MatchApiError::DatabaseError(e.to_string())
    }
}

/// The match repository. Apart from catalog imports, only score synchronisation writes to it.
#[allow(async_fn_in_trait)]
pub trait MatchManagement {
    async fn insert_match(&self, new_match: NewMatch) -> Result<Match, MatchApiError>;

    async fn fetch_match(&self, id: i64) -> Result<Option<Match>, MatchApiError>;

    async fn fetch_match_by_external_id(&self, external_id: &str) -> Result<Option<Match>, MatchApiError>;

    /// Fetches all the matches with the given ids. Ids with no match are silently skipped.
    async fn fetch_matches(&self, ids: &[i64]) -> Result<Vec<Match>, MatchApiError>;

    /// Applies a provider score to the match with the same external id.
    ///
    /// * Finished matches are never modified.
    /// * A completed flag from the provider finishes the match.
    /// * Known scores on a match that has not completed make it `Live`.
    /// * A status never regresses.
    async fn apply_score_update(&self, score: &ProviderScore) -> Result<ScoreUpdateOutcome, MatchApiError>;

    /// The distinct league keys of unfinished matches that kicked off between `now - lookback` and `now`.
    async fn fetch_active_league_keys(&self, now: DateTime<Utc>, lookback: Duration)
        -> Result<Vec<String>, MatchApiError>;

    /// Moves every `Scheduled` match whose start time has passed to `Live`. Returns the ids of the affected matches.
    async fn mark_started_matches_live(&self, now: DateTime<Utc>) -> Result<Vec<i64>, MatchApiError>;

    /// Finishes every unfinished match that has a known score and kicked off more than `max_duration` ago.
    /// Returns the ids of the affected matches.
    async fn finish_stale_matches(&self, now: DateTime<Utc>, max_duration: Duration)
        -> Result<Vec<i64>, MatchApiError>;
}
