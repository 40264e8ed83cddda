use log::*;
use settlement_engine::traits::{MailerError, SubscriptionMailer};

/// Writes subscription emails to the log instead of sending them.
///
/// Used until an SMTP relay is configured for the deployment.
#[derive(Debug, Clone)]
pub struct LoggingMailer {
    from: String,
}

impl LoggingMailer {
    pub fn new<S: Into<String>>(from: S) -> Self {
        Self { from: from.into() }
    }
}

pub fn expiring_email_body(username: &str, tipster_name: &str, days_remaining: u32) -> String {
    let days = if days_remaining == 1 { "1 day".to_string() } else { format!("{days_remaining} days") };
    format!(
        "Hi {username},\n\nYour subscription to {tipster_name} ends in {days}. Renew it to keep receiving their \
         tickets.\n"
    )
}

impl SubscriptionMailer for LoggingMailer {
    async fn send_subscription_expiring_email(
        &self,
        email: &str,
        username: &str,
        tipster_name: &str,
        days_remaining: u32,
    ) -> Result<(), MailerError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(MailerError::InvalidRecipient(email.to_string()));
        }
        let body = expiring_email_body(username, tipster_name, days_remaining);
        info!("📅️ Mail from {} to {email}: Your subscription ends soon\n{body}", self.from);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn bad_recipients_are_rejected() {
        let mailer = LoggingMailer::new("no-reply@example.com");
        let err = mailer.send_subscription_expiring_email("alice", "alice", "sharp_tips", 3).await.unwrap_err();
        assert!(matches!(err, MailerError::InvalidRecipient(_)));
        assert!(mailer.send_subscription_expiring_email("alice@example.com", "alice", "sharp_tips", 3).await.is_ok());
    }

    #[test]
    fn email_body() {
        assert!(expiring_email_body("alice", "sharp_tips", 1).contains("ends in 1 day."));
        assert!(expiring_email_body("alice", "sharp_tips", 3).contains("ends in 3 days."));
    }
}
