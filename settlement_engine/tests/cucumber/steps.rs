use std::time::Duration;

use chrono::Utc;
use cucumber::{gherkin::Step, given, then, when};
use settlement_engine::{
    db_types::{NewSelection, NewTicket, TicketResult, TicketStatus, TransactionType},
    events::NotificationType,
    traits::{LedgerManagement, MatchManagement, ProviderScore, TicketManagement},
    ScoreSyncApi,
    ScoreSyncOptions,
    SettlementApi,
    TicketLockingApi,
};
use tipster_common::{helpers::parse_comma_list, Money};

use crate::{
    cucumber::SettlementWorld,
    support::fixtures::{buy, game, subscribe, user},
};

#[given(expr = "the users {string}")]
async fn create_users(world: &mut SettlementWorld, names: String) {
    let system = world.system_mut();
    for name in parse_comma_list(&names) {
        let u = user(&system.db, &name).await;
        system.users.insert(name, u);
    }
}

#[given(expr = "match {word} in {word} between {string} and {string} kicked off {int} minutes ago")]
async fn started_match(world: &mut SettlementWorld, ext_id: String, league: String, home: String, away: String, mins: i64) {
    let system = world.system_mut();
    let start = Utc::now() - chrono::Duration::minutes(mins);
    let m = game(&system.db, &ext_id, &league, &home, &away, start).await;
    system.matches.insert(ext_id, m);
}

#[given(expr = "{word} publishes ticket {string} for {int} EUR with selections:")]
async fn publish_ticket(world: &mut SettlementWorld, step: &Step, tipster: String, title: String, price: i64) {
    let system = world.system_mut();
    let tipster_id = system.user(&tipster).id;
    let table = step.table.as_ref().expect("The selections table is missing");
    let mut ticket = NewTicket::new(tipster_id, title.as_str(), Money::from_major(price));
    for row in table.rows.iter().skip(1) {
        let m = system.game(&row[0]);
        let odds = row[3].parse::<f64>().expect("Odds must be a decimal number");
        let selection = NewSelection::new(m.id, row[1].as_str(), row[2].as_str(), odds).with_match_label(m.label());
        ticket = ticket.with_selection(selection);
    }
    let ticket = system.db.insert_ticket(ticket).await.expect("Error inserting ticket");
    system.tickets.insert(title, ticket);
}

#[given(expr = "{word} buys ticket {string}")]
async fn buy_ticket(world: &mut SettlementWorld, buyer: String, title: String) {
    let system = world.system();
    buy(&system.db, system.ticket(&title), system.user(&buyer)).await;
}

#[given(expr = "{word} subscribes to {word} for {int} days")]
async fn subscribe_to(world: &mut SettlementWorld, subscriber: String, tipster: String, days: i64) {
    let system = world.system();
    let remaining = chrono::Duration::days(days);
    subscribe(&system.db, system.user(&subscriber), system.user(&tipster), Utc::now(), remaining).await;
}

#[when("the locking job runs")]
async fn run_locking(world: &mut SettlementWorld) {
    let system = world.system();
    TicketLockingApi::new(system.db.clone()).lock_started_tickets(Utc::now()).await.expect("Error locking tickets");
}

#[when(expr = "the provider reports {word} finished {int}-{int} in {word}")]
async fn provider_reports(world: &mut SettlementWorld, ext_id: String, home: i32, away: i32, league: String) {
    let score = ProviderScore { external_id: ext_id, home_score: Some(home), away_score: Some(away), completed: true };
    world.system().scores.report(&league, score);
}

#[when("the score sync job runs")]
async fn run_score_sync(world: &mut SettlementWorld) {
    let system = world.system();
    let api = ScoreSyncApi::new(system.db.clone(), system.scores.clone(), ScoreSyncOptions::default());
    let report = api.run_sync(Utc::now()).await.expect("Error syncing scores");
    assert!(report.league_failures.is_empty(), "League failures: {:?}", report.league_failures);
}

#[when("the settlement job runs")]
async fn run_settlement(world: &mut SettlementWorld) {
    let system = world.system();
    let api = SettlementApi::new(system.db.clone(), system.producers.clone());
    let report = api.settle_locked_tickets(Utc::now()).await.expect("Error settling tickets");
    assert!(report.failed.is_empty(), "Tickets failed to settle: {:?}", report.failed);
}

#[then(expr = "ticket {string} is {word}")]
async fn check_ticket_status(world: &mut SettlementWorld, title: String, status: String) {
    let system = world.system();
    let id = system.ticket(&title).id;
    let ticket = system.db.fetch_ticket(id).await.expect("Error fetching ticket").expect("Ticket vanished");
    let expected = status.parse::<TicketStatus>().expect("Not a ticket status");
    assert_eq!(ticket.status, expected);
}

#[then(expr = "ticket {string} is Finished with result {word}")]
async fn check_ticket_result(world: &mut SettlementWorld, title: String, result: String) {
    let system = world.system();
    let id = system.ticket(&title).id;
    let ticket = system.db.fetch_ticket(id).await.expect("Error fetching ticket").expect("Ticket vanished");
    assert_eq!(ticket.status, TicketStatus::Finished);
    assert_eq!(ticket.result, result.parse::<TicketResult>().expect("Not a ticket result"));
}

#[then(expr = "match {word} is Finished with score {int}-{int}")]
async fn check_match_score(world: &mut SettlementWorld, ext_id: String, home: i32, away: i32) {
    let system = world.system();
    let m = system.db.fetch_match_by_external_id(&ext_id).await.expect("Error fetching match").expect("No such match");
    assert!(m.is_finished(), "Match {ext_id} is {}", m.status);
    assert_eq!(m.final_score(), Some((home, away)));
}

#[then(expr = "{word} has {int} winning payout(s) of {float} EUR for ticket {string}")]
async fn check_payouts(world: &mut SettlementWorld, name: String, count: usize, amount: f64, title: String) {
    let system = world.system();
    let user_id = system.user(&name).id;
    let ticket_id = system.ticket(&title).id;
    let wins = system
        .db
        .fetch_transactions_for_reference(TransactionType::Win, ticket_id)
        .await
        .expect("Error fetching transactions")
        .into_iter()
        .filter(|tx| tx.user_id == user_id)
        .collect::<Vec<_>>();
    assert_eq!(wins.len(), count, "Unexpected number of payouts for {name}");
    #[allow(clippy::cast_possible_truncation)]
    let expected = Money::from((amount * 100.0).round() as i64);
    assert!(wins.iter().all(|tx| tx.amount == expected), "Payouts for {name}: {wins:?}");
}

#[then(expr = "{word} has a balance of {float} EUR")]
async fn check_balance(world: &mut SettlementWorld, name: String, amount: f64) {
    let system = world.system();
    let wallet = system.db.fetch_wallet(system.user(&name).id).await.expect("Error fetching wallet");
    #[allow(clippy::cast_possible_truncation)]
    let expected = Money::from((amount * 100.0).round() as i64);
    assert_eq!(wallet.map(|w| w.balance).unwrap_or_default(), expected);
}

/// Notifications are delivered on a separate task, so this waits for them to arrive.
#[then(expr = "{string} are told about ticket {string} once")]
async fn check_ticket_notifications(world: &mut SettlementWorld, names: String, title: String) {
    let system = world.system();
    let ticket_id = system.ticket(&title).id;
    let mut expected = parse_comma_list(&names).iter().map(|n| system.user(n).id).collect::<Vec<_>>();
    expected.sort();
    let mut received = Vec::new();
    for _ in 0..40 {
        received = system
            .captured
            .notifications()
            .into_iter()
            .filter(|n| n.notification_type == NotificationType::TicketResult && n.data["ticket_id"] == ticket_id)
            .map(|n| n.user_id)
            .collect::<Vec<_>>();
        received.sort();
        if received.len() >= expected.len() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(received, expected);
}
