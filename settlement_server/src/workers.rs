//! The periodic jobs.
//!
//! Every job runs in its own task on its own interval, and no job waits on another. Each tick spawns a run, and a
//! [`JobGuard`] makes the tick a no-op while the previous run of the same job is still going. When the shutdown
//! signal arrives, a worker stops ticking and waits for its in-flight run to complete.
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use log::*;
use settlement_engine::{
    traits::{MatchManagement, ScoreSource, SettlementDatabase, SubscriptionMailer, SubscriptionManagement, TicketManagement},
    ScoreSyncApi,
    ScoreSyncReport,
    SettlementApi,
    SettlementReport,
    SubscriptionExpiryApi,
    SubscriptionSweepResult,
    TicketLockingApi,
};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

/// A flag that is set for as long as one run of a job is in progress.
#[derive(Clone, Default)]
pub struct JobGuard {
    running: Arc<AtomicBool>,
}

impl JobGuard {
    /// Claims the guard, unless a run is already in progress. The guard is released when the returned value is
    /// dropped.
    pub fn try_start(&self) -> Option<RunningJob> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningJob { running: Arc::clone(&self.running) })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

pub struct RunningJob {
    running: Arc<AtomicBool>,
}

impl Drop for RunningJob {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Starts a worker that calls `job` every `period` until `shutdown` fires or its sender goes away.
///
/// Do not await the returned JoinHandle before signalling shutdown, as it will run indefinitely.
pub fn start_worker<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let job = Arc::new(job);
        let guard = JobGuard::default();
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<()>> = None;
        info!("🕰️ {name} worker started. Running every {}s", period.as_secs_f32());
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let Some(run) = guard.try_start() else {
                        warn!("🕰️ The previous {name} run is still in progress. Skipping this tick.");
                        continue;
                    };
                    let job = Arc::clone(&job);
                    in_flight = Some(tokio::spawn(async move {
                        trace!("🕰️ Running {name} job");
                        job().await;
                        drop(run);
                    }));
                },
                _ = shutdown.changed() => break,
            }
        }
        if let Some(run) = in_flight.take() {
            if !run.is_finished() {
                info!("🕰️ Waiting for the current {name} run to complete");
            }
            if let Err(e) = run.await {
                error!("🕰️ The last {name} run did not complete cleanly. {e}");
            }
        }
        info!("🕰️ {name} worker stopped");
    })
}

pub async fn run_locking_job<B: TicketManagement>(api: &TicketLockingApi<B>) {
    match api.lock_started_tickets(Utc::now()).await {
        Ok(result) if result.count() > 0 => info!("🕰️ {} tickets locked", result.count()),
        Ok(_) => trace!("🕰️ No tickets needed locking"),
        Err(e) => error!("🕰️ Error running the ticket locking job: {e}"),
    }
}

pub async fn run_score_sync_job<B, S>(api: &ScoreSyncApi<B, S>, quota_warning_threshold: u64) -> Option<ScoreSyncReport>
where
    B: MatchManagement,
    S: ScoreSource,
{
    match api.run_sync(Utc::now()).await {
        Ok(report) => {
            info!(
                "🕰️ Score sync: {} leagues polled, {} failed, {} matches updated, {} marked live, {} finished locally",
                report.leagues_polled.len(),
                report.league_failures.len(),
                report.matches_updated.len(),
                report.marked_live.len(),
                report.finished_locally.len()
            );
            if report.was_rate_limited() {
                warn!("🕰️ The score provider rejected requests because the quota is exhausted");
            }
            if quota_is_low(&report, quota_warning_threshold) {
                warn!(
                    "🕰️ Only {:?} score provider requests remain. The warning threshold is {quota_warning_threshold}.",
                    report.lowest_quota.and_then(|q| q.remaining)
                );
            }
            Some(report)
        },
        Err(e) => {
            error!("🕰️ Error running the score sync job: {e}");
            None
        },
    }
}

/// True when the provider reported a remaining quota below `threshold` during the run.
pub fn quota_is_low(report: &ScoreSyncReport, threshold: u64) -> bool {
    report.lowest_quota.and_then(|q| q.remaining).is_some_and(|remaining| remaining < threshold)
}

pub async fn run_settlement_job<B: SettlementDatabase>(api: &SettlementApi<B>) -> Option<SettlementReport> {
    match api.settle_locked_tickets(Utc::now()).await {
        Ok(report) => {
            if report.examined > 0 {
                info!(
                    "🕰️ Settlement: {} examined, {} won, {} lost, {} pending, {} failed, {} payouts",
                    report.examined,
                    report.won.len(),
                    report.lost.len(),
                    report.pending.len(),
                    report.failed.len(),
                    report.payouts
                );
            }
            Some(report)
        },
        Err(e) => {
            error!("🕰️ Error running the settlement job: {e}");
            None
        },
    }
}

pub async fn run_subscription_job<B, M>(api: &SubscriptionExpiryApi<B, M>) -> Option<SubscriptionSweepResult>
where
    B: SubscriptionManagement,
    M: SubscriptionMailer,
{
    match api.run_sweep(Utc::now()).await {
        Ok(result) => {
            info!(
                "🕰️ Subscriptions: {} notifications, {} expired, {} emails sent, {} emails failed",
                result.notifications(),
                result.expired.len(),
                result.emails_sent,
                result.email_failures
            );
            if !result.failed.is_empty() {
                warn!("🕰️ Subscriptions that will be retried on the next sweep: {:?}", result.failed);
            }
            Some(result)
        },
        Err(e) => {
            error!("🕰️ Error running the subscription expiry job: {e}");
            None
        },
    }
}
