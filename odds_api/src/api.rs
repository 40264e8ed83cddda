use std::sync::Arc;

use log::*;
use reqwest::{Client, StatusCode};

use crate::{
    config::OddsApiConfig,
    data_objects::{ScoreEvent, ScoresResponse},
    helpers::quota_from_headers,
    OddsApiError,
};

#[derive(Clone)]
pub struct OddsApi {
    config: OddsApiConfig,
    client: Arc<Client>,
}

impl OddsApi {
    pub fn new(config: OddsApiConfig) -> Result<Self, OddsApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OddsApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &OddsApiConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v4{path}", self.config.base_url)
    }

    /// Fetches live and recently completed games for the given sport/league key, e.g. `soccer_epl`.
    ///
    /// The quota headers are returned with the data. A `429` response is reported as
    /// [`OddsApiError::RateLimited`] so that callers can tell an exhausted quota from an outage.
    pub async fn get_scores(&self, sport_key: &str) -> Result<ScoresResponse, OddsApiError> {
        let url = self.url(&format!("/sports/{sport_key}/scores/"));
        let days_from = self.config.days_from.to_string();
        let params = [("apiKey", self.config.api_key.reveal().as_str()), ("daysFrom", days_from.as_str())];
        trace!("📡️ Fetching scores for {sport_key}");
        let response = self.client.get(url).query(&params).send().await.map_err(|e| {
            if e.is_timeout() {
                OddsApiError::Timeout(e.to_string())
            } else {
                OddsApiError::RestResponseError(e.to_string())
            }
        })?;
        let quota = quota_from_headers(response.headers());
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let message = response.text().await.unwrap_or_default();
            return Err(OddsApiError::RateLimited(format!("{message} (remaining: {:?})", quota.requests_remaining)));
        }
        if !status.is_success() {
            let message = response.text().await.map_err(|e| OddsApiError::RestResponseError(e.to_string()))?;
            return Err(OddsApiError::QueryError { status: status.as_u16(), message });
        }
        let events = response.json::<Vec<ScoreEvent>>().await.map_err(|e| OddsApiError::JsonError(e.to_string()))?;
        debug!("📡️ {} score events received for {sport_key}. Quota: {quota:?}", events.len());
        Ok(ScoresResponse { events, quota })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn urls() {
        let config = OddsApiConfig { base_url: "http://localhost:9000".into(), ..Default::default() };
        let api = OddsApi::new(config).unwrap();
        assert_eq!(api.url("/sports/soccer_epl/scores/"), "http://localhost:9000/v4/sports/soccer_epl/scores/");
    }
}
