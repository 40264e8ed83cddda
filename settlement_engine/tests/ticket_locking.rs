use chrono::{Duration, Utc};
use settlement_engine::{
    db_types::{NewSelection, NewTicket, NewTicketPurchase, TicketStatus},
    traits::{TicketApiError, TicketManagement},
    TicketLockingApi,
};
use tipster_common::Money;

mod support;

use support::{
    fixtures::{buy, game, ticket, user},
    prepare_env::{setup_db, tear_down},
};

#[tokio::test]
async fn tickets_lock_when_their_first_match_starts() {
    let db = setup_db().await;
    let now = Utc::now();
    let tipster = user(&db, "tipster").await;
    let early = game(&db, "evt-1", "soccer_epl", "Arsenal", "Chelsea", now - Duration::minutes(5)).await;
    let late = game(&db, "evt-2", "soccer_epl", "Everton", "Fulham", now + Duration::hours(3)).await;
    let future = game(&db, "evt-3", "soccer_epl", "Leeds", "Spurs", now + Duration::hours(5)).await;

    let started = ticket(&db, &tipster, "Started", Money::from_major(5), &[(&early, "h2h", "1", 1.5), (&late, "h2h", "2", 2.0)]).await;
    let waiting = ticket(&db, &tipster, "Waiting", Money::from_major(5), &[(&late, "h2h", "1", 1.5), (&future, "btts", "yes", 1.7)]).await;

    let api = TicketLockingApi::new(db.clone());
    let result = api.lock_started_tickets(now).await.unwrap();
    assert_eq!(result.locked, vec![started.id]);

    let started = db.fetch_ticket(started.id).await.unwrap().unwrap();
    assert_eq!(started.status, TicketStatus::Locked);
    let waiting = db.fetch_ticket(waiting.id).await.unwrap().unwrap();
    assert_eq!(waiting.status, TicketStatus::Open);

    // A second run finds nothing new, and an already locked ticket is not an error
    let again = api.lock_started_tickets(now).await.unwrap();
    assert!(again.locked.is_empty());

    // Later on, the second ticket's first match starts too
    let later = api.lock_started_tickets(now + Duration::hours(4)).await.unwrap();
    assert_eq!(later.locked, vec![waiting.id]);
    tear_down(db).await;
}

#[tokio::test]
async fn deleted_tickets_are_never_locked() {
    let db = setup_db().await;
    let now = Utc::now();
    let tipster = user(&db, "tipster").await;
    let m = game(&db, "evt-1", "soccer_epl", "Arsenal", "Chelsea", now - Duration::hours(1)).await;
    let t = ticket(&db, &tipster, "Withdrawn", Money::from_major(5), &[(&m, "h2h", "1", 1.5)]).await;
    assert!(db.soft_delete_ticket(t.id).await.unwrap());
    assert!(!db.soft_delete_ticket(t.id).await.unwrap());

    let result = TicketLockingApi::new(db.clone()).lock_started_tickets(now).await.unwrap();
    assert!(result.locked.is_empty());
    let t = db.fetch_ticket(t.id).await.unwrap().unwrap();
    assert_eq!(t.status, TicketStatus::Open);
    assert!(t.is_deleted());
    tear_down(db).await;
}

#[tokio::test]
async fn locked_tickets_cannot_be_bought() {
    let db = setup_db().await;
    let now = Utc::now();
    let tipster = user(&db, "tipster").await;
    let alice = user(&db, "alice").await;
    let bob = user(&db, "bob").await;
    let m = game(&db, "evt-1", "soccer_epl", "Arsenal", "Chelsea", now - Duration::hours(1)).await;
    let t = ticket(&db, &tipster, "Single", Money::from_major(5), &[(&m, "h2h", "1", 1.5)]).await;
    buy(&db, &t, &alice).await;

    let duplicate = db
        .insert_purchase(NewTicketPurchase {
            ticket_id: t.id,
            buyer_id: alice.id,
            price_paid: t.price,
        })
        .await;
    assert!(matches!(duplicate, Err(TicketApiError::DuplicatePurchase { .. })));

    TicketLockingApi::new(db.clone()).lock_started_tickets(now).await.unwrap();
    let late = db
        .insert_purchase(NewTicketPurchase {
            ticket_id: t.id,
            buyer_id: bob.id,
            price_paid: t.price,
        })
        .await;
    assert!(matches!(late, Err(TicketApiError::NotOnSale(id)) if id == t.id));
    assert_eq!(db.fetch_purchases(t.id).await.unwrap().len(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn tickets_need_selections_with_valid_odds() {
    let db = setup_db().await;
    let tipster = user(&db, "tipster").await;
    let empty = NewTicket::new(tipster.id, "Empty", Money::from_major(1));
    assert!(matches!(db.insert_ticket(empty).await, Err(TicketApiError::NoSelections)));

    let m = game(&db, "evt-1", "soccer_epl", "Arsenal", "Chelsea", Utc::now()).await;
    let bad = NewTicket::new(tipster.id, "Bad odds", Money::from_major(1))
        .with_selection(NewSelection::new(m.id, "h2h", "1", 0.0));
    assert!(matches!(db.insert_ticket(bad).await, Err(TicketApiError::InvalidOdds(_))));
    tear_down(db).await;
}
