use std::time::Duration;

use log::*;
use tipster_common::Secret;

const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com";
const DEFAULT_DAYS_FROM: u8 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct OddsApiConfig {
    /// Scheme and host of the provider, without a trailing slash.
    pub base_url: String,
    pub api_key: Secret<String>,
    /// How many days of completed games the scores endpoint should return. The provider accepts 1 to 3.
    pub days_from: u8,
    /// Per-request timeout. Keep this shorter than the score sync interval.
    pub timeout: Duration,
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: Secret::default(),
            days_from: DEFAULT_DAYS_FROM,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OddsApiConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SE_ODDS_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("📡️ SE_ODDS_API_URL not set, using {DEFAULT_BASE_URL}");
                DEFAULT_BASE_URL.to_string()
            });
        let api_key = Secret::new(std::env::var("SE_ODDS_API_KEY").unwrap_or_else(|_| {
            warn!("📡️ SE_ODDS_API_KEY not set. Score requests will be rejected by the provider.");
            String::default()
        }));
        let days_from = std::env::var("SE_ODDS_API_DAYS_FROM")
            .ok()
            .and_then(|s| {
                s.parse::<u8>().map_err(|e| warn!("📡️ Invalid value for SE_ODDS_API_DAYS_FROM. {e}")).ok()
            })
            .map(|d| d.clamp(1, 3))
            .unwrap_or(DEFAULT_DAYS_FROM);
        Self { base_url, api_key, days_from, ..Default::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
