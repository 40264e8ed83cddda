use std::{env, str::FromStr, time::Duration};

use log::*;
use odds_api::OddsApiConfig;
use settlement_engine::{sqlite::db::db_url, ScoreSyncOptions};
use tipster_common::helpers::{parse_boolean_flag, parse_comma_list};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;
const DEFAULT_LOCKING_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_SCORE_SYNC_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_SETTLEMENT_INTERVAL: Duration = Duration::from_secs(120);
const DEFAULT_SUBSCRIPTION_INTERVAL: Duration = Duration::from_secs(3600);
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LEAGUE_LOOKBACK_HOURS: i64 = 72;
const DEFAULT_MATCH_MAX_DURATION_HOURS: i64 = 4;
const DEFAULT_SETTLEMENT_CONCURRENCY: usize = 4;
const DEFAULT_QUOTA_WARNING_THRESHOLD: u64 = 50;
const DEFAULT_MAILER_FROM: &str = "no-reply@tipster.local";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Queue depth for each event hook
    pub event_buffer_size: usize,
    pub locking_interval: Duration,
    pub score_sync_interval: Duration,
    pub settlement_interval: Duration,
    pub subscription_interval: Duration,
    pub score_sync: ScoreSyncOptions,
    pub settlement_concurrency: usize,
    /// A warning is logged when the provider reports fewer remaining requests than this
    pub quota_warning_threshold: u64,
    pub odds_api: OddsApiConfig,
    /// Sender address for subscription emails
    pub mailer_from: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            locking_interval: DEFAULT_LOCKING_INTERVAL,
            score_sync_interval: DEFAULT_SCORE_SYNC_INTERVAL,
            settlement_interval: DEFAULT_SETTLEMENT_INTERVAL,
            subscription_interval: DEFAULT_SUBSCRIPTION_INTERVAL,
            score_sync: ScoreSyncOptions::default(),
            settlement_concurrency: DEFAULT_SETTLEMENT_CONCURRENCY,
            quota_warning_threshold: DEFAULT_QUOTA_WARNING_THRESHOLD,
            odds_api: OddsApiConfig::default(),
            mailer_from: DEFAULT_MAILER_FROM.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = db_url();
        let max_connections = env_or_default("SE_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let event_buffer_size = env_or_default("SE_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let locking_interval = interval_from_env("SE_LOCKING_INTERVAL_SECS", DEFAULT_LOCKING_INTERVAL);
        let score_sync_interval = interval_from_env("SE_SCORE_SYNC_INTERVAL_SECS", DEFAULT_SCORE_SYNC_INTERVAL);
        let settlement_interval = interval_from_env("SE_SETTLEMENT_INTERVAL_SECS", DEFAULT_SETTLEMENT_INTERVAL);
        let subscription_interval = interval_from_env("SE_SUBSCRIPTION_INTERVAL_SECS", DEFAULT_SUBSCRIPTION_INTERVAL);
        let settlement_concurrency =
            env_or_default("SE_SETTLEMENT_CONCURRENCY", DEFAULT_SETTLEMENT_CONCURRENCY).max(1);
        let quota_warning_threshold = env_or_default("SE_QUOTA_WARNING_THRESHOLD", DEFAULT_QUOTA_WARNING_THRESHOLD);
        let score_sync = score_sync_options_from_env(score_sync_interval);
        let odds_api = OddsApiConfig::new_from_env_or_default().with_timeout(score_sync.provider_timeout);
        let mailer_from = env::var("SE_MAILER_FROM").unwrap_or_else(|_| {
            info!("🪛️ SE_MAILER_FROM is not set. Using {DEFAULT_MAILER_FROM}.");
            DEFAULT_MAILER_FROM.to_string()
        });
        Self {
            database_url,
            max_connections,
            event_buffer_size,
            locking_interval,
            score_sync_interval,
            settlement_interval,
            subscription_interval,
            score_sync,
            settlement_concurrency,
            quota_warning_threshold,
            odds_api,
            mailer_from,
        }
    }
}

fn score_sync_options_from_env(sync_interval: Duration) -> ScoreSyncOptions {
    let provider_enabled = parse_boolean_flag(env::var("SE_SCORE_SYNC_ENABLED").ok(), true);
    if !provider_enabled {
        info!("🪛️ Score provider sync is disabled. Matches will only be reconciled locally.");
    }
    let tracked_leagues = env::var("SE_TRACKED_LEAGUES").map(|s| parse_comma_list(&s)).unwrap_or_else(|_| {
        info!("🪛️ SE_TRACKED_LEAGUES is not set. Only leagues with recent unfinished matches will be polled.");
        Vec::new()
    });
    let mut provider_timeout = interval_from_env("SE_PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT);
    if provider_timeout >= sync_interval {
        provider_timeout = sync_interval / 2;
        warn!(
            "🪛️ The provider timeout must be shorter than the score sync interval. Using {}s instead.",
            provider_timeout.as_secs_f32()
        );
    }
    let lookback = env_or_default("SE_LEAGUE_LOOKBACK_HOURS", DEFAULT_LEAGUE_LOOKBACK_HOURS);
    let max_duration = env_or_default("SE_MATCH_MAX_DURATION_HOURS", DEFAULT_MATCH_MAX_DURATION_HOURS);
    ScoreSyncOptions {
        provider_enabled,
        tracked_leagues,
        league_lookback: chrono::Duration::hours(lookback.max(1)),
        max_match_duration: chrono::Duration::hours(max_duration.max(1)),
        provider_timeout,
        ..Default::default()
    }
}

/// Reads and parses `name`. Missing or invalid values fall back to `default`.
fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name} ({s}). {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

fn interval_from_env(name: &str, default: Duration) -> Duration {
    let secs = env_or_default(name, default.as_secs());
    if secs == 0 {
        warn!("🪛️ {name} cannot be zero. Using the default of {}s.", default.as_secs());
        return default;
    }
    Duration::from_secs(secs)
}
