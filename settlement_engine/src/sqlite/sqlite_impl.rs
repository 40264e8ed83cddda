//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::{Connection, SqlitePool};
use tipster_common::Money;

use super::db::{db_url, matches, new_pool, subscriptions, tickets, users, wallets};
use crate::{
    db_types::{
        Match,
        NewMatch,
        NewSubscription,
        NewTicket,
        NewTicketPurchase,
        NewUser,
        NewWalletTransaction,
        Selection,
        Subscription,
        SubscriptionFlag,
        Ticket,
        TicketPurchase,
        TicketResult,
        TicketStatus,
        TransactionType,
        User,
        Wallet,
        WalletTransaction,
    },
    resolution::next_match_state,
    traits::{
        LedgerApiError,
        LedgerManagement,
        MatchApiError,
        MatchManagement,
        ProviderScore,
        ScoreUpdateOutcome,
        SettlementDatabase,
        SettlementDatabaseError,
        SettlementOutcome,
        SubscriptionApiError,
        SubscriptionContact,
        SubscriptionManagement,
        TicketApiError,
        TicketManagement,
        TicketSettlement,
        UserApiError,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn settle_ticket(&self, settlement: TicketSettlement) -> Result<SettlementOutcome, SettlementDatabaseError> {
        let TicketSettlement { ticket_id, result, payouts } = settlement;
        if result == TicketResult::Pending {
            return Err(SettlementDatabaseError::PendingResult(ticket_id));
        }
        let mut tx = self.pool.begin().await?;
        // The guarded status change comes first, so this transaction takes the write lock before reading anything.
        if tickets::finish_ticket(ticket_id, result, &mut tx).await? == 0 {
            debug!("🗃️ Ticket #{ticket_id} is no longer locked. Someone else settled it.");
            tx.rollback().await?;
            return Ok(SettlementOutcome::AlreadySettled);
        }
        let mut postings = Vec::with_capacity(payouts.len());
        if result == TicketResult::Win {
            for payout in payouts {
                if !payout.amount.is_positive() {
                    debug!("🗃️ Nothing to pay user #{} for ticket #{ticket_id}", payout.user_id);
                    continue;
                }
                let wallet = wallets::fetch_or_create_wallet(payout.user_id, &mut tx).await?;
                let entry = NewWalletTransaction::win(wallet.id, payout.user_id, payout.amount, ticket_id);
                if let Some(posted) = wallets::insert_transaction(entry, &mut tx).await? {
                    wallets::adjust_balance(wallet.id, payout.amount, &mut tx).await?;
                    postings.push(posted);
                }
            }
        }
        let ticket =
            tickets::fetch_ticket(ticket_id, &mut tx).await?.ok_or(SettlementDatabaseError::TicketNotFound(ticket_id))?;
        tx.commit().await?;
        debug!("🗃️ Ticket #{ticket_id} settled as {result} with {} payouts", postings.len());
        Ok(SettlementOutcome::Settled { ticket, postings })
    }
}

impl MatchManagement for SqliteDatabase {
    async fn insert_match(&self, new_match: NewMatch) -> Result<Match, MatchApiError> {
        let mut tx = self.pool.begin().await?;
        let inserted = matches::insert_match(new_match, &mut tx).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn fetch_match(&self, id: i64) -> Result<Option<Match>, MatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let m = matches::fetch_match(id, &mut conn).await?;
        Ok(m)
    }

    async fn fetch_match_by_external_id(&self, external_id: &str) -> Result<Option<Match>, MatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let m = matches::fetch_match_by_external_id(external_id, &mut conn).await?;
        Ok(m)
    }

    async fn fetch_matches(&self, ids: &[i64]) -> Result<Vec<Match>, MatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = matches::fetch_matches(ids, &mut conn).await?;
        Ok(result)
    }

    async fn apply_score_update(&self, score: &ProviderScore) -> Result<ScoreUpdateOutcome, MatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let Some(current) = matches::fetch_match_by_external_id(&score.external_id, &mut conn).await? else {
            return Ok(ScoreUpdateOutcome::UnknownMatch);
        };
        if current.is_finished() {
            return Ok(ScoreUpdateOutcome::AlreadyFinished);
        }
        let Some((status, final_score)) = next_match_state(&current, score) else {
            return Ok(ScoreUpdateOutcome::Unchanged);
        };
        // A concurrent writer may have finished the match since we read it. The guarded update then does nothing.
        let mut tx = conn.begin().await?;
        let outcome = match matches::update_result(current.id, status, final_score, &mut tx).await? {
            Some(updated) => ScoreUpdateOutcome::Updated(updated),
            None => ScoreUpdateOutcome::AlreadyFinished,
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn fetch_active_league_keys(
        &self,
        now: DateTime<Utc>,
        lookback: Duration,
    ) -> Result<Vec<String>, MatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let keys = matches::fetch_active_league_keys(now, now - lookback, &mut conn).await?;
        Ok(keys)
    }

    async fn mark_started_matches_live(&self, now: DateTime<Utc>) -> Result<Vec<i64>, MatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = matches::mark_started_matches_live(now, &mut conn).await?;
        Ok(ids)
    }

    async fn finish_stale_matches(
        &self,
        now: DateTime<Utc>,
        max_duration: Duration,
    ) -> Result<Vec<i64>, MatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = matches::finish_scored_matches_started_before(now - max_duration, &mut conn).await?;
        Ok(ids)
    }
}

impl TicketManagement for SqliteDatabase {
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, TicketApiError> {
        let mut tx = self.pool.begin().await?;
        let ticket = tickets::insert_ticket(ticket, &mut tx).await?;
        tx.commit().await?;
        Ok(ticket)
    }

    async fn fetch_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::fetch_ticket(ticket_id, &mut conn).await?;
        Ok(ticket)
    }

    async fn fetch_selections(&self, ticket_id: i64) -> Result<Vec<Selection>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let selections = tickets::fetch_selections(ticket_id, &mut conn).await?;
        Ok(selections)
    }

    async fn fetch_tickets_with_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = tickets::fetch_tickets_with_status(status, &mut conn).await?;
        Ok(result)
    }

    async fn lock_started_tickets(&self, now: DateTime<Utc>) -> Result<Vec<i64>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = tickets::lock_started_tickets(now, &mut conn).await?;
        Ok(ids)
    }

    async fn soft_delete_ticket(&self, ticket_id: i64) -> Result<bool, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = tickets::soft_delete_ticket(ticket_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn insert_purchase(&self, purchase: NewTicketPurchase) -> Result<TicketPurchase, TicketApiError> {
        let mut tx = self.pool.begin().await?;
        let purchase = tickets::insert_purchase(purchase, &mut tx).await?;
        tx.commit().await?;
        Ok(purchase)
    }

    async fn fetch_purchases(&self, ticket_id: i64) -> Result<Vec<TicketPurchase>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let purchases = tickets::fetch_purchases(ticket_id, &mut conn).await?;
        Ok(purchases)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_wallet(&self, user_id: i64) -> Result<Option<Wallet>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let wallet = wallets::fetch_wallet_for_user(user_id, &mut conn).await?;
        Ok(wallet)
    }

    async fn deposit(
        &self,
        user_id: i64,
        amount: Money,
        description: Option<String>,
    ) -> Result<WalletTransaction, LedgerApiError> {
        if !amount.is_positive() {
            return Err(LedgerApiError::InvalidAmount(amount));
        }
        let mut tx = self.pool.begin().await?;
        let wallet = wallets::fetch_or_create_wallet(user_id, &mut tx).await?;
        let entry = NewWalletTransaction::deposit(wallet.id, user_id, amount, description);
        let posted = wallets::insert_transaction(entry, &mut tx)
            .await?
            .ok_or_else(|| LedgerApiError::DatabaseError(format!("Deposit for user #{user_id} was not recorded")))?;
        wallets::adjust_balance(wallet.id, amount, &mut tx).await?;
        tx.commit().await?;
        Ok(posted)
    }

    async fn fetch_transactions_for_user(&self, user_id: i64) -> Result<Vec<WalletTransaction>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let txs = wallets::fetch_transactions_for_user(user_id, &mut conn).await?;
        Ok(txs)
    }

    async fn fetch_transactions_for_reference(
        &self,
        tx_type: TransactionType,
        reference_id: i64,
    ) -> Result<Vec<WalletTransaction>, LedgerApiError> {
        let mut conn = self.pool.acquire().await?;
        let txs = wallets::fetch_transactions_for_reference(tx_type, reference_id, &mut conn).await?;
        Ok(txs)
    }
}

impl SubscriptionManagement for SqliteDatabase {
    async fn insert_subscription(&self, subscription: NewSubscription) -> Result<Subscription, SubscriptionApiError> {
        if subscription.end_date <= subscription.start_date {
            return Err(SubscriptionApiError::InvalidPeriod(format!(
                "{} is not after {}",
                subscription.end_date, subscription.start_date
            )));
        }
        let mut tx = self.pool.begin().await?;
        let sub = subscriptions::insert_subscription(subscription, &mut tx).await?;
        tx.commit().await?;
        Ok(sub)
    }

    async fn fetch_subscription(&self, id: i64) -> Result<Option<Subscription>, SubscriptionApiError> {
        let mut conn = self.pool.acquire().await?;
        let sub = subscriptions::fetch_subscription(id, &mut conn).await?;
        Ok(sub)
    }

    async fn fetch_active_subscriber_ids(
        &self,
        tipster_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, SubscriptionApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = subscriptions::fetch_active_subscriber_ids(tipster_id, now, &mut conn).await?;
        Ok(ids)
    }

    async fn fetch_expiring_subscriptions(
        &self,
        now: DateTime<Utc>,
        horizon: Duration,
    ) -> Result<Vec<SubscriptionContact>, SubscriptionApiError> {
        let mut conn = self.pool.acquire().await?;
        let subs = subscriptions::fetch_expiring_subscriptions(now, now + horizon, &mut conn).await?;
        Ok(subs)
    }

    async fn fetch_lapsed_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionContact>, SubscriptionApiError> {
        let mut conn = self.pool.acquire().await?;
        let subs = subscriptions::fetch_lapsed_subscriptions(now, &mut conn).await?;
        Ok(subs)
    }

    async fn claim_notification_flag(&self, id: i64, flag: SubscriptionFlag) -> Result<bool, SubscriptionApiError> {
        let mut conn = self.pool.acquire().await?;
        let claimed = subscriptions::claim_notification_flag(id, flag, &mut conn).await?;
        Ok(claimed)
    }

    async fn expire_subscription(&self, id: i64) -> Result<bool, SubscriptionApiError> {
        let mut conn = self.pool.acquire().await?;
        let expired = subscriptions::expire_subscription(id, &mut conn).await?;
        Ok(expired)
    }

    async fn cancel_subscription(&self, id: i64) -> Result<bool, SubscriptionApiError> {
        let mut conn = self.pool.acquire().await?;
        let cancelled = subscriptions::cancel_subscription(id, &mut conn).await?;
        Ok(cancelled)
    }
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, UserApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_users(&self, ids: &[i64]) -> Result<Vec<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = users::fetch_users(ids, &mut conn).await?;
        Ok(result)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `SE_DATABASE_URL` or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
