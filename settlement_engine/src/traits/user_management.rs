use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The username {0} is already taken")]
    UsernameTaken(String),
}

impl From<sqlx::Error> for UserApiError {
    fn from(e: sqlx::Error) -> Self {
        UserApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    async fn insert_user(&self, user: NewUser) -> Result<User, UserApiError>;

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, UserApiError>;

    async fn fetch_users(&self, ids: &[i64]) -> Result<Vec<User>, UserApiError>;
}
