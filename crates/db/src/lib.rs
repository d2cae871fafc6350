//! Database layer with SQLx for the library service.
//!
//! Provides:
//! - The repository port ([`BookStore`], [`UserStore`], [`SessionStore`],
//!   combined as [`Repository`])
//! - The PostgreSQL adapter [`Database`] with pool management via [`create_pool`]
//! - An in-memory adapter [`MemoryRepository`] (feature `memory`)
//!
//! # Example
//!
//! ```ignore
//! use library_db::{create_pool, Database, DbConfig, BookStore};
//!
//! let pool = create_pool(&DbConfig::from_url("postgres://localhost/library")).await?;
//! let db = Database::new(pool);
//! let book = db.get_book(1).await?;
//! ```

#![expect(clippy::doc_markdown, reason = "SQLx capitalization is intentional")]

mod models;
mod repository;

use library_core::AppError;

// =============================================================================
// Internal helpers
// =============================================================================

/// Database error wrapper for ergonomic error conversion.
///
/// Wraps `sqlx::Error` to enable automatic conversion to `AppError`
/// via the `?` operator throughout repository methods.
#[derive(Debug)]
struct DbError(sqlx::Error);

impl From<sqlx::Error> for DbError {
    #[inline]
    fn from(e: sqlx::Error) -> Self {
        Self(e)
    }
}

impl DbError {
    /// Whether the failure is a unique constraint violation.
    fn is_unique_violation(&self) -> bool {
        self.0
            .as_database_error()
            .is_some_and(|e| e.is_unique_violation())
    }
}

/// PostgreSQL `query_canceled` (cancel request or `statement_timeout`).
const QUERY_CANCELED: &str = "57014";

impl From<DbError> for AppError {
    #[inline]
    fn from(e: DbError) -> Self {
        match e.0 {
            sqlx::Error::PoolTimedOut => {
                Self::DeadlineExceeded("Timed out acquiring a database connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                Self::Cancelled("Database pool closed during shutdown".to_string())
            }
            sqlx::Error::Database(db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
                Self::Cancelled(db.message().to_string())
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

// =============================================================================
// Public exports
// =============================================================================

pub use models::{Book, NewBook, NewSession, NewUser, Session, User};

pub use repository::{
    BookStore, Database, DbConfig, MIGRATOR, Repository, SessionStore, UserStore, create_pool,
};

#[cfg(feature = "memory")]
pub use repository::MemoryRepository;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_deadline_exceeded() {
        assert!(matches!(
            AppError::from(DbError(sqlx::Error::PoolTimedOut)),
            AppError::DeadlineExceeded(_)
        ));
    }

    #[test]
    fn closed_pool_is_cancelled() {
        assert!(matches!(
            AppError::from(DbError(sqlx::Error::PoolClosed)),
            AppError::Cancelled(_)
        ));
    }

    #[test]
    fn other_failures_are_unavailable() {
        assert!(matches!(
            AppError::from(DbError(sqlx::Error::RowNotFound)),
            AppError::Unavailable(_)
        ));
    }
}
