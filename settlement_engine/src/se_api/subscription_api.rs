use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use serde_json::json;

use crate::{
    db_types::{SubscriptionFlag, SubscriptionStatus},
    events::{EventProducers, NotificationType},
    se_api::{errors::SettlementError, notifier::Notifier, report_objects::SubscriptionSweepResult},
    traits::{SubscriptionContact, SubscriptionMailer, SubscriptionManagement},
};

/// Decides which expiry warning, if any, is due for a subscription with `remaining` time left.
/// Returns the flag guarding the warning and the number of days to quote to the subscriber.
pub fn warning_due(remaining: Duration) -> Option<(SubscriptionFlag, u32)> {
    let j1 = Duration::days(1);
    let j2 = Duration::days(2);
    let j3 = Duration::days(3);
    if remaining > j2 && remaining <= j3 {
        Some((SubscriptionFlag::ExpiringJ3, 3))
    } else if remaining > Duration::zero() && remaining <= j1 {
        Some((SubscriptionFlag::ExpiringJ1, 1))
    } else {
        None
    }
}

/// Warns subscribers before their subscription ends, and expires it once it has.
///
/// Every notification is guarded by a one-shot flag that is claimed *before* anything is sent, so repeated or
/// concurrent sweeps never notify twice. The cost is that a crash between the claim and the send loses that one
/// notification.
pub struct SubscriptionExpiryApi<B, M> {
    db: B,
    mailer: M,
    notifier: Notifier,
}

impl<B, M> Debug for SubscriptionExpiryApi<B, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SubscriptionExpiryApi")
    }
}

impl<B, M> SubscriptionExpiryApi<B, M> {
    pub fn new(db: B, mailer: M, producers: EventProducers) -> Self {
        Self { db, mailer, notifier: Notifier::new(producers) }
    }
}

impl<B, M> SubscriptionExpiryApi<B, M>
where
    B: SubscriptionManagement,
    M: SubscriptionMailer,
{
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SubscriptionSweepResult, SettlementError> {
        let mut result = SubscriptionSweepResult::default();
        self.warning_pass(now, &mut result).await?;
        self.expiry_pass(now, &mut result).await?;
        if result.notifications() > 0 || !result.expired.is_empty() {
            info!(
                "📅️ Subscription sweep: {} J-3 warnings, {} J-1 warnings, {} expired, {} expiry notices",
                result.j3_warnings.len(),
                result.j1_warnings.len(),
                result.expired.len(),
                result.expiry_notices.len()
            );
        }
        Ok(result)
    }

    async fn warning_pass(&self, now: DateTime<Utc>, result: &mut SubscriptionSweepResult) -> Result<(), SettlementError> {
        let expiring = self.db.fetch_expiring_subscriptions(now, Duration::days(3)).await?;
        trace!("📅️ {} subscriptions end within three days", expiring.len());
        for contact in expiring {
            let sub = &contact.subscription;
            let Some((flag, days)) = warning_due(sub.end_date - now) else {
                continue;
            };
            if sub.has_flag(flag) {
                continue;
            }
            match self.send_warning(&contact, flag, days, result).await {
                Ok(true) => match flag {
                    SubscriptionFlag::ExpiringJ3 => result.j3_warnings.push(sub.id),
                    _ => result.j1_warnings.push(sub.id),
                },
                Ok(false) => trace!("📅️ The {flag} for subscription #{} was already sent", sub.id),
                Err(e) => {
                    error!("📅️ Could not process the {flag} for subscription #{}: {e}", sub.id);
                    result.failed.push(sub.id);
                },
            }
        }
        Ok(())
    }

    async fn send_warning(
        &self,
        contact: &SubscriptionContact,
        flag: SubscriptionFlag,
        days: u32,
        result: &mut SubscriptionSweepResult,
    ) -> Result<bool, SettlementError> {
        let sub = &contact.subscription;
        if !self.db.claim_notification_flag(sub.id, flag).await? {
            return Ok(false);
        }
        let title = "Your subscription is ending soon";
        let message = format!(
            "Your subscription to {} ends in {days} day{}.",
            contact.tipster_username,
            if days == 1 { "" } else { "s" }
        );
        let data = json!({
            "subscription_id": sub.id,
            "tipster_id": sub.tipster_id,
            "days_remaining": days,
        });
        self.notifier.notify_user(sub.subscriber_id, NotificationType::SubscriptionExpiring, title, &message, data).await;
        match self
            .mailer
            .send_subscription_expiring_email(
                &contact.subscriber_email,
                &contact.subscriber_username,
                &contact.tipster_username,
                days,
            )
            .await
        {
            Ok(()) => {
                debug!("📅️ Expiry warning email sent for subscription #{}", sub.id);
                result.emails_sent += 1;
            },
            Err(e) => {
                // The flag stays set
                error!("📅️ Expiry warning email for subscription #{} could not be delivered: {e}", sub.id);
                result.email_failures += 1;
            },
        }
        Ok(true)
    }

    async fn expiry_pass(&self, now: DateTime<Utc>, result: &mut SubscriptionSweepResult) -> Result<(), SettlementError> {
        let lapsed = self.db.fetch_lapsed_subscriptions(now).await?;
        trace!("📅️ {} subscriptions need the expiry pass", lapsed.len());
        for contact in lapsed {
            let id = contact.subscription.id;
            if let Err(e) = self.expire(&contact, result).await {
                error!("📅️ Could not expire subscription #{id}: {e}");
                result.failed.push(id);
            }
        }
        Ok(())
    }

    async fn expire(&self, contact: &SubscriptionContact, result: &mut SubscriptionSweepResult) -> Result<(), SettlementError> {
        let sub = &contact.subscription;
        if sub.status == SubscriptionStatus::Active && self.db.expire_subscription(sub.id).await? {
            debug!("📅️ Subscription #{} has expired", sub.id);
            result.expired.push(sub.id);
        }
        if sub.notified_expired || !self.db.claim_notification_flag(sub.id, SubscriptionFlag::Expired).await? {
            return Ok(());
        }
        let message = format!("Your subscription to {} has ended.", contact.tipster_username);
        let data = json!({ "subscription_id": sub.id, "tipster_id": sub.tipster_id });
        self.notifier
            .notify_user(sub.subscriber_id, NotificationType::SubscriptionExpired, "Subscription expired", &message, data)
            .await;
        result.expiry_notices.push(sub.id);
        Ok(())
    }
}
