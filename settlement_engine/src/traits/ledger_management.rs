use thiserror::Error;
use tipster_common::Money;

use crate::db_types::{TransactionType, Wallet, WalletTransaction};

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),
}

impl From<sqlx::Error> for LedgerApiError {
    fn from(e: sqlx::Error) -> Self {
        LedgerApiError::DatabaseError(e.to_string())
    }
}

/// Read access to wallets and the append-only ledger, plus manual credits.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Fetches the wallet for the user, if one has been opened.
    async fn fetch_wallet(&self, user_id: i64) -> Result<Option<Wallet>, LedgerApiError>;

    /// Credits a user's wallet, opening it if necessary. The balance and the ledger entry are written atomically.
    async fn deposit(
        &self,
        user_id: i64,
        amount: Money,
        description: Option<String>,
    ) -> Result<WalletTransaction, LedgerApiError>;

    async fn fetch_transactions_for_user(&self, user_id: i64) -> Result<Vec<WalletTransaction>, LedgerApiError>;

    async fn fetch_transactions_for_reference(
        &self,
        tx_type: TransactionType,
        reference_id: i64,
    ) -> Result<Vec<WalletTransaction>, LedgerApiError>;
}
