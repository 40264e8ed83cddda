use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewSubscription, Subscription, SubscriptionFlag},
    traits::data_objects::SubscriptionContact,
};

#[derive(Debug, Clone, Error)]
pub enum SubscriptionApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Subscription {0} does not exist")]
    SubscriptionNotFound(i64),
    #[error("Invalid subscription period: {0}")]
    InvalidPeriod(String),
}

impl From<sqlx::Error> for SubscriptionApiError {
    fn from(e: sqlx::Error) -> Self {
        SubscriptionApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait SubscriptionManagement {
    async fn insert_subscription(&self, subscription: NewSubscription) -> Result<Subscription, SubscriptionApiError>;

    async fn fetch_subscription(&self, id: i64) -> Result<Option<Subscription>, SubscriptionApiError>;

    /// The ids of users holding an active, unexpired subscription to the tipster.
    async fn fetch_active_subscriber_ids(
        &self,
        tipster_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, SubscriptionApiError>;

    /// Active subscriptions that end in the window `(now, now + horizon]`.
    async fn fetch_expiring_subscriptions(
        &self,
        now: DateTime<Utc>,
        horizon: Duration,
    ) -> Result<Vec<SubscriptionContact>, SubscriptionApiError>;

    /// Subscriptions that need the expiry pass: active ones whose end date has passed, and expired ones whose
    /// expiry notice was never sent.
    async fn fetch_lapsed_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionContact>, SubscriptionApiError>;

    /// Sets the notification flag if it is not already set. Returns true only for the caller that set it.
    async fn claim_notification_flag(&self, id: i64, flag: SubscriptionFlag) -> Result<bool, SubscriptionApiError>;

    /// Moves an active subscription to `Expired`. Returns false if it was not active.
    async fn expire_subscription(&self, id: i64) -> Result<bool, SubscriptionApiError>;

    /// Moves an active subscription to `Cancelled`. Returns false if it was not active.
    async fn cancel_subscription(&self, id: i64) -> Result<bool, SubscriptionApiError>;
}
