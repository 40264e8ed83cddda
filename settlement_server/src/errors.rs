use odds_api::OddsApiError;
use settlement_engine::SettlementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The score provider client could not be created. {0}")]
    ScoreProviderError(#[from] OddsApiError),
    #[error("An error occurred in the settlement engine. {0}")]
    BackendError(#[from] SettlementError),
    #[error("A background worker stopped unexpectedly. {0}")]
    WorkerError(String),
}
