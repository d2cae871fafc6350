//! Book catalog service shared by the REST and gRPC adapters.
//!
//! - `mod.rs` - input types and the transport-neutral operations
//! - `handlers.rs` - gRPC `LibraryService` trait implementation

mod handlers;

use std::sync::Arc;

use library_core::{AppError, ValidateExt, validation};
use library_db::{Book, NewBook};
use serde::Deserialize;
use tracing::{info, instrument};

use super::auth::SessionService;
use crate::core::ServiceContext;
use crate::middleware::RequestLogger;

/// Fields of a new book.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookInput {
    pub title: String,
    pub year: i32,
}

impl ValidateExt for BookInput {
    fn validate(&self) -> Result<(), AppError> {
        validation::validate_title(&self.title)?;
        validation::validate_year(self.year)
    }
}

/// Replacement title and year for an existing book.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookUpdate {
    pub id: i64,
    pub title: String,
    pub year: i32,
}

impl ValidateExt for BookUpdate {
    fn validate(&self) -> Result<(), AppError> {
        validation::validate_title(&self.title)?;
        validation::validate_year(self.year)
    }
}

/// Catalog operations plus the session service used for owner resolution.
pub struct LibraryService {
    ctx: Arc<ServiceContext>,
    sessions: Arc<SessionService>,
}

impl LibraryService {
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>, sessions: Arc<SessionService>) -> Self {
        Self { ctx, sessions }
    }

    #[inline]
    #[must_use]
    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// Create a book, optionally owned by `owner`. Invalid input never reaches storage.
    #[instrument(parent = log.span(), skip_all, fields(user_id = ?owner))]
    pub async fn add_book(
        &self,
        log: &RequestLogger,
        input: &BookInput,
        owner: Option<i64>,
    ) -> Result<Book, AppError> {
        input.validate()?;
        let book = self
            .ctx
            .bounded(
                "save_book",
                self.ctx.repo().save_book(NewBook {
                    title: &input.title,
                    year: input.year,
                    user_id: owner,
                }),
            )
            .await?;
        info!(book_id = book.id, "Book added");
        Ok(book)
    }

    #[instrument(parent = log.span(), skip_all, fields(book_id = id))]
    pub async fn get_book(&self, log: &RequestLogger, id: i64) -> Result<Book, AppError> {
        let book = self
            .ctx
            .bounded("get_book", self.ctx.repo().get_book(id))
            .await?;
        info!("Book fetched");
        Ok(book)
    }

    /// Delete a book. Deleting an absent id succeeds.
    #[instrument(parent = log.span(), skip_all, fields(book_id = id))]
    pub async fn delete_book(&self, log: &RequestLogger, id: i64) -> Result<(), AppError> {
        self.ctx
            .bounded("delete_book", self.ctx.repo().delete_book(id))
            .await?;
        info!("Book deleted");
        Ok(())
    }

    /// Replace title and year. Ownership is left unchanged and a missing id is not an error.
    #[instrument(parent = log.span(), skip_all, fields(book_id = update.id))]
    pub async fn update_book(
        &self,
        log: &RequestLogger,
        update: &BookUpdate,
    ) -> Result<(), AppError> {
        update.validate()?;
        let book = Book {
            id: update.id,
            title: update.title.clone(),
            year: update.year,
            user_id: None,
        };
        self.ctx
            .bounded("update_book", self.ctx.repo().update_book(&book))
            .await?;
        info!("Book updated");
        Ok(())
    }

    /// List books in id order, truncated to `limit` when given.
    #[instrument(parent = log.span(), skip_all, fields(limit = ?limit))]
    pub async fn all_books(
        &self,
        log: &RequestLogger,
        limit: Option<i64>,
    ) -> Result<Vec<Book>, AppError> {
        if let Some(limit) = limit {
            validation::validate_limit(limit)?;
        }
        let mut books = self
            .ctx
            .bounded("list_books", self.ctx.repo().list_books())
            .await?;
        if let Some(limit) = limit.and_then(|l| usize::try_from(l).ok()) {
            books.truncate(limit);
        }
        info!(count = books.len(), "Books listed");
        Ok(books)
    }
}
