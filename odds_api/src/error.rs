use thiserror::Error;

#[derive(Debug, Error)]
pub enum OddsApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The request timed out: {0}")]
    Timeout(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Request quota exhausted. {0}")]
    RateLimited(String),
    #[error("Invalid score value: {0}")]
    InvalidScore(String),
}
