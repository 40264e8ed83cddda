use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A score for one match, as reported by an external provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderScore {
    pub external_id: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    /// The provider considers the match over
    pub completed: bool,
}

impl ProviderScore {
    /// Both scores, if the provider supplied both. A lone score is treated as no score at all.
    pub fn final_score(&self) -> Option<(i32, i32)> {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        }
    }
}

/// Request quota information, when the provider reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSignal {
    pub remaining: Option<u64>,
    pub used: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBatch {
    pub scores: Vec<ProviderScore>,
    pub quota: Option<QuotaSignal>,
}

#[derive(Debug, Clone, Error)]
pub enum ScoreSourceError {
    #[error("The score provider is unavailable: {0}")]
    Unavailable(String),
    #[error("The score provider did not answer in time: {0}")]
    Timeout(String),
    #[error("The score provider quota is exhausted: {0}")]
    RateLimited(String),
    #[error("The score provider sent data we could not use: {0}")]
    InvalidData(String),
}

/// An external source of match results, queried one league at a time.
#[allow(async_fn_in_trait)]
pub trait ScoreSource {
    async fn get_scores(&self, league_key: &str) -> Result<ScoreBatch, ScoreSourceError>;
}
