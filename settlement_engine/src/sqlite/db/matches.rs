use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Match, MatchStatus, NewMatch},
    traits::MatchApiError,
};

pub async fn insert_match(new_match: NewMatch, conn: &mut SqliteConnection) -> Result<Match, MatchApiError> {
    let external_id = new_match.external_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO matches (external_id, sport, league_key, home_team, away_team, start_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(new_match.external_id)
    .bind(new_match.sport)
    .bind(new_match.league_key)
    .bind(new_match.home_team)
    .bind(new_match.away_team)
    .bind(new_match.start_time)
    .fetch_one(conn)
    .await;
    match result {
        Ok(m) => Ok(m),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(MatchApiError::DuplicateMatch(external_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_match(id: i64, conn: &mut SqliteConnection) -> Result<Option<Match>, sqlx::Error> {
    let m = sqlx::query_as("SELECT * FROM matches WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(m)
}

pub async fn fetch_match_by_external_id(
    external_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, sqlx::Error> {
    let m = sqlx::query_as("SELECT * FROM matches WHERE external_id = $1")
        .bind(external_id)
        .fetch_optional(conn)
        .await?;
    Ok(m)
}

pub async fn fetch_matches(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Match>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM matches WHERE id IN (");
    let mut values = builder.separated(", ");
    ids.iter().for_each(|id| {
        values.push_bind(*id);
    });
    builder.push(") ORDER BY id");
    let matches = builder.build_query_as::<Match>().fetch_all(conn).await?;
    Ok(matches)
}

/// Writes the new status and scores for the match, unless the match is already finished.
/// Returns the updated match, or `None` if the guard prevented the write.
pub async fn update_result(
    id: i64,
    status: MatchStatus,
    score: Option<(i32, i32)>,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, sqlx::Error> {
    let (home, away) = score.unzip();
    let updated = sqlx::query_as(
        r#"
            UPDATE matches SET status = $1, home_score = $2, away_score = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $4 AND status <> 'Finished'
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(home)
    .bind(away)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    if updated.is_some() {
        debug!("🗃️ Match #{id} is now {status} with score {score:?}");
    }
    Ok(updated)
}

pub async fn fetch_active_league_keys(
    now: DateTime<Utc>,
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, sqlx::Error> {
    let keys = sqlx::query_scalar(
        r#"
            SELECT DISTINCT league_key FROM matches
            WHERE status <> 'Finished'
              AND julianday(start_time) <= julianday($1)
              AND julianday(start_time) >= julianday($2)
            ORDER BY league_key;
        "#,
    )
    .bind(now)
    .bind(since)
    .fetch_all(conn)
    .await?;
    Ok(keys)
}

pub async fn mark_started_matches_live(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        r#"
            UPDATE matches SET status = 'Live', updated_at = CURRENT_TIMESTAMP
            WHERE status = 'Scheduled' AND julianday(start_time) <= julianday($1)
            RETURNING id;
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

/// Finishes unfinished matches with a known score that kicked off at or before `cutoff`.
pub async fn finish_scored_matches_started_before(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        r#"
            UPDATE matches SET status = 'Finished', updated_at = CURRENT_TIMESTAMP
            WHERE status <> 'Finished'
              AND home_score IS NOT NULL
              AND away_score IS NOT NULL
              AND julianday(start_time) <= julianday($1)
            RETURNING id;
        "#,
    )
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}
