use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewUser, User},
    traits::UserApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserApiError> {
    let username = user.username.clone();
    let result = sqlx::query_as("INSERT INTO users (username, email) VALUES ($1, $2) RETURNING *")
        .bind(user.username)
        .bind(user.email)
        .fetch_one(conn)
        .await;
    match result {
        Ok(u) => Ok(u),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(UserApiError::UsernameTaken(username)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_users(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM users WHERE id IN (");
    let mut values = builder.separated(", ");
    ids.iter().for_each(|id| {
        values.push_bind(*id);
    });
    builder.push(") ORDER BY id");
    let users = builder.build_query_as::<User>().fetch_all(conn).await?;
    Ok(users)
}
