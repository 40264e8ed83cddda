use log::*;
use odds_api::{OddsApi, OddsApiConfig, OddsApiError, ScoreEvent, ScoresResponse};
use settlement_engine::traits::{ProviderScore, QuotaSignal, ScoreBatch, ScoreSource, ScoreSourceError};

/// Feeds results from The Odds API into score synchronisation.
#[derive(Clone)]
pub struct OddsApiScoreSource {
    api: OddsApi,
}

impl OddsApiScoreSource {
    pub fn new(config: OddsApiConfig) -> Result<Self, OddsApiError> {
        let api = OddsApi::new(config)?;
        Ok(Self { api })
    }
}

impl ScoreSource for OddsApiScoreSource {
    async fn get_scores(&self, league_key: &str) -> Result<ScoreBatch, ScoreSourceError> {
        let response = self.api.get_scores(league_key).await.map_err(score_source_error)?;
        Ok(score_batch(response))
    }
}

pub fn score_source_error(e: OddsApiError) -> ScoreSourceError {
    match e {
        OddsApiError::Timeout(s) => ScoreSourceError::Timeout(s),
        OddsApiError::RateLimited(s) => ScoreSourceError::RateLimited(s),
        OddsApiError::JsonError(s) | OddsApiError::InvalidScore(s) => ScoreSourceError::InvalidData(s),
        e => ScoreSourceError::Unavailable(e.to_string()),
    }
}

/// Converts a provider response. Events with a score we cannot read are dropped, so that one bad record does not
/// cost us the rest of the league.
pub fn score_batch(response: ScoresResponse) -> ScoreBatch {
    let ScoresResponse { events, quota } = response;
    let scores = events.iter().filter_map(provider_score).collect();
    let quota = quota.is_known().then_some(QuotaSignal { remaining: quota.requests_remaining, used: quota.requests_used });
    ScoreBatch { scores, quota }
}

fn provider_score(event: &ScoreEvent) -> Option<ProviderScore> {
    let scores = event.home_score().and_then(|home| event.away_score().map(|away| (home, away)));
    match scores {
        Ok((home_score, away_score)) => Some(ProviderScore {
            external_id: event.id.clone(),
            home_score,
            away_score,
            completed: event.completed,
        }),
        Err(e) => {
            warn!("📡️ Ignoring event {} ({} v {}). {e}", event.id, event.home_team, event.away_team);
            None
        },
    }
}
