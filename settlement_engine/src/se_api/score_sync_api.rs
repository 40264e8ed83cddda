//! Keeps match results in step with the external score provider.
//!
//! A sync run has three steps:
//! 1. Scheduled matches whose start time has passed become `Live`.
//! 2. When provider polling is enabled, each tracked league is polled with its own timeout. Leagues run
//!    concurrently, and a failing league never affects the others.
//! 3. Matches with a known score that started longer ago than the maximum match duration are finished.
use std::{collections::BTreeSet, fmt::Debug};

use chrono::{DateTime, Duration, Utc};
use futures_util::{stream, StreamExt};
use log::*;

use crate::{
    se_api::{
        errors::SettlementError,
        report_objects::{LeagueFailure, ScoreSyncReport},
    },
    traits::{MatchManagement, ScoreBatch, ScoreSource, ScoreSourceError, ScoreUpdateOutcome},
};

#[derive(Debug, Clone)]
pub struct ScoreSyncOptions {
    /// When false, the provider is never called and only local reconciliation runs
    pub provider_enabled: bool,
    /// Leagues that are always polled, whether or not we know of an unfinished match in them
    pub tracked_leagues: Vec<String>,
    /// How far back to look for unfinished matches when deciding which leagues to poll
    pub league_lookback: Duration,
    /// Matches with a score that kicked off longer ago than this are considered over
    pub max_match_duration: Duration,
    pub provider_timeout: std::time::Duration,
    pub max_concurrent_leagues: usize,
}

impl Default for ScoreSyncOptions {
    fn default() -> Self {
        Self {
            provider_enabled: true,
            tracked_leagues: Vec::new(),
            league_lookback: Duration::hours(72),
            max_match_duration: Duration::hours(4),
            provider_timeout: std::time::Duration::from_secs(30),
            max_concurrent_leagues: 4,
        }
    }
}

pub struct ScoreSyncApi<B, S> {
    db: B,
    source: S,
    options: ScoreSyncOptions,
}

impl<B, S> Debug for ScoreSyncApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScoreSyncApi({:?})", self.options)
    }
}

impl<B, S> ScoreSyncApi<B, S> {
    pub fn new(db: B, source: S, options: ScoreSyncOptions) -> Self {
        Self { db, source, options }
    }

    pub fn options(&self) -> &ScoreSyncOptions {
        &self.options
    }
}

impl<B, S> ScoreSyncApi<B, S>
where
    B: MatchManagement,
    S: ScoreSource,
{
    pub async fn run_sync(&self, now: DateTime<Utc>) -> Result<ScoreSyncReport, SettlementError> {
        let mut report = ScoreSyncReport { provider_enabled: self.options.provider_enabled, ..Default::default() };
        report.marked_live = self.db.mark_started_matches_live(now).await?;
        if !report.marked_live.is_empty() {
            debug!("📡️ {} matches have kicked off: {:?}", report.marked_live.len(), report.marked_live);
        }
        if self.options.provider_enabled {
            self.poll_provider(now, &mut report).await?;
        } else {
            debug!("📡️ Score provider sync is disabled. Only local reconciliation will run.");
        }
        report.finished_locally = self.db.finish_stale_matches(now, self.options.max_match_duration).await?;
        if !report.finished_locally.is_empty() {
            info!("📡️ {} matches passed their maximum duration and are now finished", report.finished_locally.len());
        }
        Ok(report)
    }

    /// The configured leagues plus the leagues of recent unfinished matches, without duplicates.
    pub async fn leagues_to_poll(&self, now: DateTime<Utc>) -> Result<Vec<String>, SettlementError> {
        let active = self.db.fetch_active_league_keys(now, self.options.league_lookback).await?;
        let leagues = self
            .options
            .tracked_leagues
            .iter()
            .cloned()
            .chain(active)
            .filter(|l| !l.trim().is_empty())
            .collect::<BTreeSet<_>>();
        Ok(leagues.into_iter().collect())
    }

    async fn poll_provider(&self, now: DateTime<Utc>, report: &mut ScoreSyncReport) -> Result<(), SettlementError> {
        let leagues = self.leagues_to_poll(now).await?;
        if leagues.is_empty() {
            debug!("📡️ No leagues to poll");
            return Ok(());
        }
        debug!("📡️ Polling {} leagues: {leagues:?}", leagues.len());
        let concurrency = self.options.max_concurrent_leagues.max(1);
        let mut results = stream::iter(leagues.iter().cloned())
            .map(|league| async move {
                let result = self.fetch_league(&league).await;
                (league, result)
            })
            .buffer_unordered(concurrency);
        while let Some((league, result)) = results.next().await {
            report.leagues_polled.push(league.clone());
            match result {
                Ok(batch) => self.apply_batch(&league, batch, report).await,
                Err(e) => {
                    let rate_limited = matches!(e, ScoreSourceError::RateLimited(_));
                    if rate_limited {
                        warn!("📡️ Score provider quota exhausted while polling {league}: {e}");
                    } else {
                        warn!("📡️ Skipping league {league}: {e}");
                    }
                    report.league_failures.push(LeagueFailure { league_key: league, reason: e.to_string(), rate_limited });
                },
            }
        }
        Ok(())
    }

    async fn fetch_league(&self, league: &str) -> Result<ScoreBatch, ScoreSourceError> {
        match tokio::time::timeout(self.options.provider_timeout, self.source.get_scores(league)).await {
            Ok(result) => result,
            Err(_) => Err(ScoreSourceError::Timeout(format!(
                "no answer for {league} after {}s",
                self.options.provider_timeout.as_secs_f32()
            ))),
        }
    }

    async fn apply_batch(&self, league: &str, batch: ScoreBatch, report: &mut ScoreSyncReport) {
        if let Some(quota) = batch.quota {
            info!("📡️ Provider quota after polling {league}: remaining {:?}, used {:?}", quota.remaining, quota.used);
            report.record_quota(quota);
        }
        report.scores_received += batch.scores.len();
        for score in &batch.scores {
            match self.db.apply_score_update(score).await {
                Ok(ScoreUpdateOutcome::Updated(m)) => {
                    debug!(
                        "📡️ Match #{} ({}) is now {} [{:?}-{:?}]",
                        m.id,
                        m.label(),
                        m.status,
                        m.home_score,
                        m.away_score
                    );
                    report.matches_updated.push(m.id);
                },
                Ok(ScoreUpdateOutcome::Unchanged) => report.unchanged += 1,
                Ok(ScoreUpdateOutcome::AlreadyFinished) => report.already_finished += 1,
                Ok(ScoreUpdateOutcome::UnknownMatch) => {
                    trace!("📡️ Ignoring score for unknown match {}", score.external_id);
                    report.unknown_matches += 1;
                },
                Err(e) => {
                    error!("📡️ Could not apply the score for match {}: {e}", score.external_id);
                    report.update_errors += 1;
                },
            }
        }
    }
}
