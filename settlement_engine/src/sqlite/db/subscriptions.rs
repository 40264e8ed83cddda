use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewSubscription, Subscription, SubscriptionFlag},
    traits::SubscriptionContact,
};

const CONTACT_QUERY: &str = r#"
    SELECT s.*,
        u.username AS subscriber_username,
        u.email AS subscriber_email,
        t.username AS tipster_username
    FROM subscriptions s
        JOIN users u ON u.id = s.subscriber_id
        JOIN users t ON t.id = s.tipster_id
"#;

pub async fn insert_subscription(
    subscription: NewSubscription,
    conn: &mut SqliteConnection,
) -> Result<Subscription, sqlx::Error> {
    let sub = sqlx::query_as(
        r#"
            INSERT INTO subscriptions (subscriber_id, tipster_id, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(subscription.subscriber_id)
    .bind(subscription.tipster_id)
    .bind(subscription.start_date)
    .bind(subscription.end_date)
    .fetch_one(conn)
    .await?;
    Ok(sub)
}

pub async fn fetch_subscription(id: i64, conn: &mut SqliteConnection) -> Result<Option<Subscription>, sqlx::Error> {
    let sub = sqlx::query_as("SELECT * FROM subscriptions WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(sub)
}

pub async fn fetch_active_subscriber_ids(
    tipster_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        r#"
            SELECT DISTINCT subscriber_id FROM subscriptions
            WHERE tipster_id = $1 AND status = 'Active' AND julianday(end_date) > julianday($2)
            ORDER BY subscriber_id;
        "#,
    )
    .bind(tipster_id)
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

/// Active subscriptions ending in `(now, until]`.
pub async fn fetch_expiring_subscriptions(
    now: DateTime<Utc>,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<SubscriptionContact>, sqlx::Error> {
    let query = format!(
        "{CONTACT_QUERY} WHERE s.status = 'Active' AND julianday(s.end_date) > julianday($1) AND \
         julianday(s.end_date) <= julianday($2) ORDER BY s.end_date"
    );
    let subs = sqlx::query_as(&query).bind(now).bind(until).fetch_all(conn).await?;
    Ok(subs)
}

pub async fn fetch_lapsed_subscriptions(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<SubscriptionContact>, sqlx::Error> {
    let query = format!(
        "{CONTACT_QUERY} WHERE (s.status = 'Active' AND julianday(s.end_date) <= julianday($1)) OR (s.status = \
         'Expired' AND s.notified_expired = 0) ORDER BY s.end_date"
    );
    let subs = sqlx::query_as(&query).bind(now).fetch_all(conn).await?;
    Ok(subs)
}

/// Sets the flag with a guarded update. Only the caller that flips the flag from 0 to 1 gets `true`.
pub async fn claim_notification_flag(
    id: i64,
    flag: SubscriptionFlag,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let column = flag.column();
    let query =
        format!("UPDATE subscriptions SET {column} = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND {column} = 0");
    let res = sqlx::query(&query).bind(id).execute(conn).await?;
    let claimed = res.rows_affected() == 1;
    if claimed {
        debug!("🗃️ Subscription #{id}: {flag} claimed");
    }
    Ok(claimed)
}

pub async fn expire_subscription(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE subscriptions SET status = 'Expired', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Active'",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn cancel_subscription(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE subscriptions SET status = 'Cancelled', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = \
         'Active'",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}
