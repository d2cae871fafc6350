//! Session repository for `sessions` operations.

use async_trait::async_trait;

use super::{Database, SessionStore};
use crate::{AppError, DbError, NewSession, Session};

#[async_trait]
impl SessionStore for Database {
    async fn save_session(&self, session: NewSession<'_>) -> Result<Session, AppError> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (user_id, token, ip, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, token, ip, user_agent, created_at",
        )
        .bind(session.user_id)
        .bind(session.token)
        .bind(session.ip)
        .bind(session.user_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError(e).into())
    }

    async fn get_user_id_by_token(&self, token: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT user_id FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError)?
            .ok_or_else(|| AppError::Unauthenticated("Invalid session token".to_string()))
    }
}
