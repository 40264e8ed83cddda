//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Writes that use `RETURNING` with `fetch_one` or `fetch_optional` leave the statement open on the connection, and
//! the row stays invisible to other connections until it is reset. Run them inside a transaction and commit.
//!
//! Timestamps are compared with `julianday()` on both sides so that stored values written with different
//! textual layouts still order correctly.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod matches;
pub mod subscriptions;
pub mod tickets;
pub mod users;
pub mod wallets;

const SQLITE_DB_URL: &str = "sqlite://data/settlement.db";

pub fn db_url() -> String {
    let result = env::var("SE_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ SE_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
