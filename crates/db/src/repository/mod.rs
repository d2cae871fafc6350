//! Repository port and adapters for the library schema.
//!
//! # Error Handling
//!
//! All repository methods return `Result<T, AppError>` where errors are:
//! - `AppError::Unavailable` - Database connection or query failures
//! - `AppError::DeadlineExceeded` - No pooled connection within the acquire timeout
//! - `AppError::NotFound` - Requested entity does not exist
//! - `AppError::AlreadyExists` - Unique constraint violated (user email)
//! - `AppError::Unauthenticated` - Session token does not exist
//!
//! # Cancellation
//!
//! Every method is a single statement on a pooled connection. Dropping the
//! returned future aborts the statement and returns the connection to the pool.

#![expect(
    clippy::missing_errors_doc,
    reason = "error handling documented at module level"
)]

mod book;
mod config;
#[cfg(feature = "memory")]
mod memory;
mod session;
mod user;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPool;

use crate::{AppError, Book, NewBook, NewSession, NewUser, Session, User};

pub use config::{DbConfig, create_pool};
#[cfg(feature = "memory")]
pub use memory::MemoryRepository;

/// Embedded schema migrations (`crates/db/migrations`).
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Persistence operations on `books`.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a book and return it with the generated id.
    async fn save_book(&self, book: NewBook<'_>) -> Result<Book, AppError>;

    /// Fetch a book by id.
    async fn get_book(&self, id: i64) -> Result<Book, AppError>;

    /// Delete a book by id. Deleting a missing id succeeds.
    async fn delete_book(&self, id: i64) -> Result<(), AppError>;

    /// Update title and year of the book with `book.id`.
    ///
    /// A missing id is not reported.
    async fn update_book(&self, book: &Book) -> Result<(), AppError>;

    /// All books in ascending id order.
    async fn list_books(&self) -> Result<Vec<Book>, AppError>;
}

/// Persistence operations on `users`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return it with the generated id.
    async fn save_user(&self, user: NewUser<'_>) -> Result<User, AppError>;

    /// Fetch a user by (canonical) email.
    async fn get_user_by_email(&self, email: &str) -> Result<User, AppError>;
}

/// Persistence operations on `sessions`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session and return it with generated id and timestamp.
    async fn save_session(&self, session: NewSession<'_>) -> Result<Session, AppError>;

    /// Resolve a session token to its owning user id.
    async fn get_user_id_by_token(&self, token: &str) -> Result<i64, AppError>;
}

/// Complete repository port consumed by the services.
#[async_trait]
pub trait Repository: BookStore + UserStore + SessionStore {
    /// Check that storage is reachable.
    async fn health_check(&self) -> bool;
}

/// PostgreSQL implementation of the repository port.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Creates a new database context over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Migration failed: {e}")))
    }

    /// Returns a reference to the underlying connection pool.
    #[inline]
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for Database {
    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
