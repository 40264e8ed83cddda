
mod score_sync {
    use chrono::{Duration, Utc};
    use settlement_engine::{
        db_types::NewMatch,
        traits::{MatchManagement, ProviderScore, QuotaSignal, ScoreBatch, ScoreSourceError},
        ScoreSyncApi,
        ScoreSyncOptions,
    };

    use crate::{
        test::mocks::{memory_db, MockScores},
        workers::{quota_is_low, run_score_sync_job},
    };

    fn options(leagues: &[&str]) -> ScoreSyncOptions {
        ScoreSyncOptions { tracked_leagues: leagues.iter().map(|s| s.to_string()).collect(), ..Default::default() }
    }

    #[tokio::test]
    async fn sync_job_polls_tracked_leagues_and_watches_the_quota() {
        let db = memory_db().await;
        let kickoff = Utc::now() - Duration::hours(2);
        let m = db.insert_match(NewMatch::new("evt-1", "soccer_epl", "Arsenal", "Chelsea", kickoff)).await.unwrap();
        let mut source = MockScores::new();
        source.expect_get_scores().withf(|league: &str| league == "soccer_epl").times(1).returning(|_| {
            Ok(ScoreBatch {
                scores: vec![ProviderScore {
                    external_id: "evt-1".into(),
                    home_score: Some(1),
                    away_score: Some(1),
                    completed: true,
                }],
                quota: Some(QuotaSignal { remaining: Some(12), used: Some(488) }),
            })
        });
        let api = ScoreSyncApi::new(db.clone(), source, options(&["soccer_epl"]));

        let report = run_score_sync_job(&api, 50).await.expect("The sync run should succeed");
        assert_eq!(report.matches_updated, vec![m.id]);
        assert!(quota_is_low(&report, 50));
        assert!(!quota_is_low(&report, 10));
        let m = db.fetch_match(m.id).await.unwrap().unwrap();
        assert!(m.is_finished());
        db.close().await;
    }

    #[tokio::test]
    async fn rate_limits_are_reported_not_fatal() {
        let db = memory_db().await;
        let mut source = MockScores::new();
        source
            .expect_get_scores()
            .times(2)
            .returning(|league| match league {
                "soccer_epl" => Err(ScoreSourceError::RateLimited("HTTP 429".into())),
                _ => Ok(ScoreBatch::default()),
            });
        let api = ScoreSyncApi::new(db.clone(), source, options(&["soccer_epl", "soccer_italy_serie_a"]));

        let report = run_score_sync_job(&api, 50).await.expect("The sync run should succeed");
        assert!(report.was_rate_limited());
        assert_eq!(report.leagues_polled.len(), 2);
        assert!(!quota_is_low(&report, 50));
        db.close().await;
    }

    #[tokio::test]
    async fn disabled_sync_never_calls_the_provider() {
        let db = memory_db().await;
        let mut source = MockScores::new();
        source.expect_get_scores().never();
        let options = ScoreSyncOptions { provider_enabled: false, ..options(&["soccer_epl"]) };
        let api = ScoreSyncApi::new(db.clone(), source, options);
        let report = run_score_sync_job(&api, 50).await.expect("The sync run should succeed");
        assert!(report.leagues_polled.is_empty());
        db.close().await;
    }
}

mod subscriptions {
    use chrono::{Duration, Utc};
    use settlement_engine::{
        db_types::{NewSubscription, NewUser},
        events::EventProducers,
        traits::{MailerError, SubscriptionManagement, UserManagement},
        SubscriptionExpiryApi,
    };

    use crate::{
        test::mocks::{memory_db, MockMailer},
        workers::run_subscription_job,
    };

    #[tokio::test]
    async fn subscription_job_emails_the_subscriber_once() -> anyhow::Result<()> {
        let db = memory_db().await;
        let tipster = db.insert_user(NewUser::new("sharp_tips", "tips@example.com")).await?;
        let alice = db.insert_user(NewUser::new("alice", "alice@example.com")).await?;
        let now = Utc::now();
        let sub = NewSubscription {
            subscriber_id: alice.id,
            tipster_id: tipster.id,
            start_date: now - Duration::days(30),
            end_date: now + Duration::hours(12),
        };
        let sub = db.insert_subscription(sub).await?;
        let mut mailer = MockMailer::new();
        mailer
            .expect_send_subscription_expiring_email()
            .withf(|email: &str, username: &str, tipster: &str, days: &u32| {
                email == "alice@example.com" && username == "alice" && tipster == "sharp_tips" && *days == 1
            })
            .times(1)
            .returning(|_, _, _, _| Err(MailerError::DeliveryFailed("relay down".into())));
        let api = SubscriptionExpiryApi::new(db.clone(), mailer, EventProducers::default());

        let first = run_subscription_job(&api).await.expect("The sweep should succeed");
        assert_eq!(first.j1_warnings, vec![sub.id]);
        assert_eq!(first.email_failures, 1);
        let second = run_subscription_job(&api).await.expect("The sweep should succeed");
        assert_eq!(second.notifications(), 0);
        assert!(db.fetch_subscription(sub.id).await?.is_some_and(|s| s.notified_expiring_j1));
        db.close().await;
        Ok(())
    }
}
