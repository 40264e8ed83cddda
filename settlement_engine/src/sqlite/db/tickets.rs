use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewSelection, NewTicket, NewTicketPurchase, Selection, Ticket, TicketPurchase, TicketResult, TicketStatus},
    traits::TicketApiError,
};

/// Inserts the ticket and all of its selections. This is not atomic. Embed the call in a transaction, passing
/// `&mut *tx` as the connection argument, to store the ticket as a unit.
pub async fn insert_ticket(ticket: NewTicket, conn: &mut SqliteConnection) -> Result<Ticket, TicketApiError> {
    let avg_odds = ticket.average_odds().ok_or(TicketApiError::NoSelections)?;
    if let Some(bad) = ticket.selections.iter().find(|s| !s.odds.is_finite() || s.odds <= 0.0) {
        return Err(TicketApiError::InvalidOdds(format!("{} on match {}", bad.odds, bad.match_id)));
    }
    let inserted: Ticket = sqlx::query_as(
        r#"
            INSERT INTO tickets (tipster_id, title, is_public, price, avg_odds)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(ticket.tipster_id)
    .bind(ticket.title)
    .bind(ticket.is_public)
    .bind(ticket.price.value())
    .bind(avg_odds)
    .fetch_one(&mut *conn)
    .await?;
    for (position, selection) in ticket.selections.into_iter().enumerate() {
        insert_selection(inserted.id, position as i64, selection, &mut *conn).await?;
    }
    debug!("🗃️ Ticket #{} stored with average odds {avg_odds:.3}", inserted.id);
    Ok(inserted)
}

async fn insert_selection(
    ticket_id: i64,
    position: i64,
    selection: NewSelection,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO ticket_selections (ticket_id, position, match_id, match_label, market_type, label, odds)
            VALUES ($1, $2, $3, $4, $5, $6, $7);
        "#,
    )
    .bind(ticket_id)
    .bind(position)
    .bind(selection.match_id)
    .bind(selection.match_label)
    .bind(selection.market_type)
    .bind(selection.label)
    .bind(selection.odds)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_ticket(ticket_id: i64, conn: &mut SqliteConnection) -> Result<Option<Ticket>, sqlx::Error> {
    let ticket = sqlx::query_as("SELECT * FROM tickets WHERE id = $1").bind(ticket_id).fetch_optional(conn).await?;
    Ok(ticket)
}

pub async fn fetch_selections(ticket_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Selection>, sqlx::Error> {
    let selections = sqlx::query_as("SELECT * FROM ticket_selections WHERE ticket_id = $1 ORDER BY position")
        .bind(ticket_id)
        .fetch_all(conn)
        .await?;
    Ok(selections)
}

pub async fn fetch_tickets_with_status(
    status: TicketStatus,
    conn: &mut SqliteConnection,
) -> Result<Vec<Ticket>, sqlx::Error> {
    let tickets = sqlx::query_as("SELECT * FROM tickets WHERE status = $1 AND deleted_at IS NULL ORDER BY id")
        .bind(status.to_string())
        .fetch_all(conn)
        .await?;
    Ok(tickets)
}

/// Locks every open, non-deleted ticket whose earliest known match start is at or before `now`.
///
/// The status guard lives in the `UPDATE` itself, so a ticket is locked exactly once however many callers race.
pub async fn lock_started_tickets(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        r#"
            UPDATE tickets SET status = 'Locked', updated_at = CURRENT_TIMESTAMP
            WHERE status = 'Open'
              AND deleted_at IS NULL
              AND id IN (
                SELECT s.ticket_id FROM ticket_selections s JOIN matches m ON m.id = s.match_id
                GROUP BY s.ticket_id
                HAVING MIN(julianday(m.start_time)) <= julianday($1)
              )
            RETURNING id;
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

/// Moves a locked ticket to `Finished` with the given result. Returns the number of rows changed, which is zero if
/// the ticket was not `Locked`.
pub async fn finish_ticket(
    ticket_id: i64,
    result: TicketResult,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        r#"
            UPDATE tickets SET status = 'Finished', result = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'Locked';
        "#,
    )
    .bind(result.to_string())
    .bind(ticket_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

pub async fn soft_delete_ticket(ticket_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE tickets SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND deleted_at \
         IS NULL",
    )
    .bind(ticket_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn insert_purchase(
    purchase: NewTicketPurchase,
    conn: &mut SqliteConnection,
) -> Result<TicketPurchase, TicketApiError> {
    let ticket = fetch_ticket(purchase.ticket_id, &mut *conn)
        .await?
        .ok_or(TicketApiError::TicketNotFound(purchase.ticket_id))?;
    if ticket.status != TicketStatus::Open || ticket.is_deleted() {
        return Err(TicketApiError::NotOnSale(ticket.id));
    }
    let result = sqlx::query_as(
        r#"
            INSERT INTO ticket_purchases (ticket_id, buyer_id, price_paid)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(purchase.ticket_id)
    .bind(purchase.buyer_id)
    .bind(purchase.price_paid.value())
    .fetch_one(conn)
    .await;
    match result {
        Ok(p) => Ok(p),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(TicketApiError::DuplicatePurchase { ticket_id: purchase.ticket_id, buyer_id: purchase.buyer_id })
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_purchases(ticket_id: i64, conn: &mut SqliteConnection) -> Result<Vec<TicketPurchase>, sqlx::Error> {
    let purchases = sqlx::query_as("SELECT * FROM ticket_purchases WHERE ticket_id = $1 ORDER BY id")
        .bind(ticket_id)
        .fetch_all(conn)
        .await?;
    Ok(purchases)
}
