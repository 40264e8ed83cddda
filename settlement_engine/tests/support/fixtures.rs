use chrono::{DateTime, Duration, Utc};
use settlement_engine::{
    db_types::{Match, NewMatch, NewSelection, NewSubscription, NewTicket, NewTicketPurchase, NewUser, Subscription, Ticket, User},
    traits::{MatchManagement, ProviderScore, ScoreUpdateOutcome, SubscriptionManagement, TicketManagement, UserManagement},
    SqliteDatabase,
};
use tipster_common::Money;

pub async fn user(db: &SqliteDatabase, name: &str) -> User {
    db.insert_user(NewUser::new(name.to_string(), format!("{name}@example.com"))).await.expect("Error inserting user")
}

pub async fn game(
    db: &SqliteDatabase,
    external_id: &str,
    league: &str,
    home: &str,
    away: &str,
    start_time: DateTime<Utc>,
) -> Match {
    db.insert_match(NewMatch::new(external_id, league, home, away, start_time)).await.expect("Error inserting match")
}

/// A ticket with one selection per `(match, market, label, odds)` entry.
pub async fn ticket(
    db: &SqliteDatabase,
    tipster: &User,
    title: &str,
    price: Money,
    selections: &[(&Match, &str, &str, f64)],
) -> Ticket {
    let ticket = selections.iter().fold(NewTicket::new(tipster.id, title, price), |t, (m, market, label, odds)| {
        t.with_selection(NewSelection::new(m.id, *market, *label, *odds).with_match_label(m.label()))
    });
    db.insert_ticket(ticket).await.expect("Error inserting ticket")
}

pub async fn buy(db: &SqliteDatabase, ticket: &Ticket, buyer: &User) {
    let purchase = NewTicketPurchase { ticket_id: ticket.id, buyer_id: buyer.id, price_paid: ticket.price };
    db.insert_purchase(purchase).await.expect("Error inserting purchase");
}

/// Applies a final score as if the provider had reported the match complete.
pub async fn finish(db: &SqliteDatabase, m: &Match, home: Option<i32>, away: Option<i32>) -> Match {
    let score = ProviderScore { external_id: m.external_id.clone(), home_score: home, away_score: away, completed: true };
    match db.apply_score_update(&score).await.expect("Error applying score") {
        ScoreUpdateOutcome::Updated(m) => m,
        other => panic!("Expected the match to be updated, got {other:?}"),
    }
}

pub async fn subscribe(
    db: &SqliteDatabase,
    subscriber: &User,
    tipster: &User,
    now: DateTime<Utc>,
    remaining: Duration,
) -> Subscription {
    let sub = NewSubscription {
        subscriber_id: subscriber.id,
        tipster_id: tipster.id,
        start_date: now - Duration::days(30),
        end_date: now + remaining,
    };
    db.insert_subscription(sub).await.expect("Error inserting subscription")
}
