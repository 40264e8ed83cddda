use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Could not deliver email: {0}")]
    DeliveryFailed(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Sends the transactional emails for the subscription lifecycle.
#[allow(async_fn_in_trait)]
pub trait SubscriptionMailer {
    async fn send_subscription_expiring_email(
        &self,
        email: &str,
        username: &str,
        tipster_name: &str,
        days_remaining: u32,
    ) -> Result<(), MailerError>;
}
