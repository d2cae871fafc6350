//! User persistence on `users`.

use async_trait::async_trait;

use super::{Database, UserStore};
use crate::{AppError, DbError, NewUser, User};

#[async_trait]
impl UserStore for Database {
    async fn save_user(&self, user: NewUser<'_>) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password)
             VALUES ($1, $2)
             RETURNING id, email, password",
        )
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let e = DbError(e);
            if e.is_unique_violation() {
                AppError::conflict("User", "email")
            } else {
                e.into()
            }
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password
               FROM users
              WHERE email = $1
              LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError)?
        .ok_or_else(|| AppError::not_found("User", email))
    }
}
