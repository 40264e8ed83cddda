use log::{debug, warn};
use sqlx::SqliteConnection;
use tipster_common::Money;

use crate::db_types::{NewWalletTransaction, TransactionType, Wallet, WalletTransaction};

/// Returns the user's wallet, opening an empty one if the user does not have one yet.
pub async fn fetch_or_create_wallet(user_id: i64, conn: &mut SqliteConnection) -> Result<Wallet, sqlx::Error> {
    let res = sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if res.rows_affected() > 0 {
        debug!("🗃️ Opened a new wallet for user #{user_id}");
    }
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1").bind(user_id).fetch_one(conn).await?;
    Ok(wallet)
}

pub async fn fetch_wallet_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Wallet>, sqlx::Error> {
    let wallet =
        sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(wallet)
}

/// Appends a ledger entry. Returns `None` if the entry would violate a uniqueness rule, which for `Win` entries
/// means the user has already been paid for this ticket.
pub async fn insert_transaction(
    tx: NewWalletTransaction,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, sqlx::Error> {
    let user_id = tx.user_id;
    let reference = tx.reference_id;
    let inserted: Option<WalletTransaction> = sqlx::query_as(
        r#"
            INSERT INTO wallet_transactions (wallet_id, user_id, tx_type, amount, reference_id, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(tx.wallet_id)
    .bind(tx.user_id)
    .bind(tx.tx_type.to_string())
    .bind(tx.amount.value())
    .bind(tx.reference_id)
    .bind(tx.description)
    .fetch_optional(conn)
    .await?;
    if inserted.is_none() {
        warn!("🗃️ Ledger entry for user #{user_id} with reference {reference:?} already exists. Skipping.");
    }
    Ok(inserted)
}

pub async fn adjust_balance(wallet_id: i64, delta: Money, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(delta.value())
        .bind(wallet_id)
        .execute(conn)
        .await?;
    debug!("🗃️ Wallet #{wallet_id} balance adjusted by {delta}");
    Ok(())
}

pub async fn fetch_transactions_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<WalletTransaction>, sqlx::Error> {
    let txs = sqlx::query_as("SELECT * FROM wallet_transactions WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}

pub async fn fetch_transactions_for_reference(
    tx_type: TransactionType,
    reference_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<WalletTransaction>, sqlx::Error> {
    let txs = sqlx::query_as("SELECT * FROM wallet_transactions WHERE tx_type = $1 AND reference_id = $2 ORDER BY id")
        .bind(tx_type.to_string())
        .bind(reference_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}
