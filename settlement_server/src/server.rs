use std::sync::Arc;

use log::*;
use settlement_engine::{
    events::EventProducers,
    ScoreSyncApi,
    SettlementApi,
    SqliteDatabase,
    SubscriptionExpiryApi,
    TicketLockingApi,
};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{notifications::create_event_handlers, odds_api::OddsApiScoreSource},
    mailer::LoggingMailer,
    workers::{run_locking_job, run_score_sync_job, run_settlement_job, run_subscription_job, start_worker},
};

/// Runs the jobs until Ctrl-C is received, then lets any in-flight runs complete before returning.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_event_handlers(config.event_buffer_size);
    let producers = handlers.producers();
    let hook_tasks = handlers.start_handlers();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = start_workers(&config, db.clone(), producers, shutdown_rx)?;
    info!("🚀️ Settlement server is running. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutdown requested. Waiting for running jobs to finish.");
    // A send error means every worker has already stopped
    let _ = shutdown_tx.send(true);
    let mut result = Ok(());
    for worker in workers {
        if let Err(e) = worker.await {
            error!("🚀️ A worker did not shut down cleanly. {e}");
            result = Err(ServerError::WorkerError(e.to_string()));
        }
    }
    // The workers held the last producers, so the event handlers now drain their queues and exit
    for task in hook_tasks {
        if let Err(e) = task.await {
            error!("🚀️ An event handler did not shut down cleanly. {e}");
        }
    }
    db.close().await;
    result
}

pub fn start_workers(
    config: &ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    shutdown: watch::Receiver<bool>,
) -> Result<Vec<JoinHandle<()>>, ServerError> {
    let source = OddsApiScoreSource::new(config.odds_api.clone())?;
    let locking_api = Arc::new(TicketLockingApi::new(db.clone()));
    let locking = start_worker("Ticket locking", config.locking_interval, shutdown.clone(), move || {
        let api = Arc::clone(&locking_api);
        async move { run_locking_job(&api).await }
    });

    let sync_api = Arc::new(ScoreSyncApi::new(db.clone(), source, config.score_sync.clone()));
    let threshold = config.quota_warning_threshold;
    let score_sync = start_worker("Score sync", config.score_sync_interval, shutdown.clone(), move || {
        let api = Arc::clone(&sync_api);
        async move {
            run_score_sync_job(&api, threshold).await;
        }
    });

    let settlement_api =
        Arc::new(SettlementApi::new(db.clone(), producers.clone()).with_concurrency(config.settlement_concurrency));
    let settlement = start_worker("Settlement", config.settlement_interval, shutdown.clone(), move || {
        let api = Arc::clone(&settlement_api);
        async move {
            run_settlement_job(&api).await;
        }
    });

    let mailer = LoggingMailer::new(config.mailer_from.clone());
    let subscription_api = Arc::new(SubscriptionExpiryApi::new(db, mailer, producers));
    let subscriptions = start_worker("Subscription expiry", config.subscription_interval, shutdown, move || {
        let api = Arc::clone(&subscription_api);
        async move {
            run_subscription_job(&api).await;
        }
    });
    Ok(vec![locking, score_sync, settlement, subscriptions])
}
