//! Book persistence on `books`.

use async_trait::async_trait;

use super::{BookStore, Database};
use crate::{AppError, Book, DbError, NewBook};

#[async_trait]
impl BookStore for Database {
    async fn save_book(&self, book: NewBook<'_>) -> Result<Book, AppError> {
        sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, year_book, user_id)
             VALUES ($1, $2, $3)
             RETURNING id, title, year_book AS year, user_id",
        )
        .bind(book.title)
        .bind(book.year)
        .bind(book.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError(e).into())
    }

    async fn get_book(&self, id: i64) -> Result<Book, AppError> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, year_book AS year, user_id
               FROM books
              WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError)?
        .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn delete_book(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError)?;
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE books
                SET title = $1,
                    year_book = $2
              WHERE id = $3",
        )
        .bind(&book.title)
        .bind(book.year)
        .bind(book.id)
        .execute(&self.pool)
        .await
        .map_err(DbError)?;

        if result.rows_affected() == 0 {
            tracing::debug!(book_id = book.id, "Update matched no rows");
        }
        Ok(())
    }

    async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, year_book AS year, user_id
               FROM books
              ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbError(e).into())
    }
}
