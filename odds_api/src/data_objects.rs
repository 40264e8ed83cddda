use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{helpers::parse_score, OddsApiError};

/// One game as returned by the provider's `scores` endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreEvent {
    /// The provider's identifier for the game. This is the `external_id` of a local match.
    pub id: String,
    pub sport_key: String,
    #[serde(default)]
    pub sport_title: Option<String>,
    pub commence_time: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    pub home_team: String,
    pub away_team: String,
    /// `None` until the game has started.
    #[serde(default)]
    pub scores: Option<Vec<TeamScore>>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamScore {
    pub name: String,
    pub score: String,
}

impl ScoreEvent {
    pub fn home_score(&self) -> Result<Option<i32>, OddsApiError> {
        self.score_for(&self.home_team)
    }

    pub fn away_score(&self) -> Result<Option<i32>, OddsApiError> {
        self.score_for(&self.away_team)
    }

    fn score_for(&self, team: &str) -> Result<Option<i32>, OddsApiError> {
        let Some(scores) = &self.scores else {
            return Ok(None);
        };
        scores.iter().find(|s| s.name == team).map(|s| parse_score(&s.score)).transpose()
    }
}

/// Request accounting reported by the provider in response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub requests_remaining: Option<u64>,
    pub requests_used: Option<u64>,
    /// The cost of the request that produced this value.
    pub requests_last: Option<u64>,
}

impl QuotaUsage {
    pub fn is_known(&self) -> bool {
        self.requests_remaining.is_some() || self.requests_used.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ScoresResponse {
    pub events: Vec<ScoreEvent>,
    pub quota: QuotaUsage,
}
