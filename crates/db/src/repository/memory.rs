//! In-memory implementation of the repository port.
//!
//! Mirrors the PostgreSQL semantics (generated ids, unique email and token,
//! idempotent delete, silent update of a missing id) without a live database.
//! Every call is counted so tests can assert that a request never reached
//! storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{BookStore, Repository, SessionStore, UserStore};
use crate::{AppError, Book, NewBook, NewSession, NewUser, Session, User};

#[derive(Debug, Default)]
struct State {
    books: BTreeMap<i64, Book>,
    users: BTreeMap<i64, User>,
    sessions: HashMap<String, Session>,
    next_book_id: i64,
    next_user_id: i64,
    next_session_id: i64,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Repository backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of storage operations performed so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All stored sessions, for assertions.
    #[must_use]
    pub fn sessions(&self) -> Vec<Session> {
        let mut sessions: Vec<_> = self.state.lock().sessions.values().cloned().collect();
        sessions.sort_by_key(|s| s.id);
        sessions
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookStore for MemoryRepository {
    async fn save_book(&self, book: NewBook<'_>) -> Result<Book, AppError> {
        self.record_call();
        let mut state = self.state.lock();
        let id = State::next_id(&mut state.next_book_id);
        let book = Book {
            id,
            title: book.title.to_string(),
            year: book.year,
            user_id: book.user_id,
        };
        state.books.insert(id, book.clone());
        Ok(book)
    }

    async fn get_book(&self, id: i64) -> Result<Book, AppError> {
        self.record_call();
        self.state
            .lock()
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn delete_book(&self, id: i64) -> Result<(), AppError> {
        self.record_call();
        self.state.lock().books.remove(&id);
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> Result<(), AppError> {
        self.record_call();
        if let Some(stored) = self.state.lock().books.get_mut(&book.id) {
            stored.title.clone_from(&book.title);
            stored.year = book.year;
        }
        Ok(())
    }

    async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        self.record_call();
        Ok(self.state.lock().books.values().cloned().collect())
    }
}

#[async_trait]
impl UserStore for MemoryRepository {
    async fn save_user(&self, user: NewUser<'_>) -> Result<User, AppError> {
        self.record_call();
        let mut state = self.state.lock();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict("User", "email"));
        }
        let id = State::next_id(&mut state.next_user_id);
        let user = User {
            id,
            email: user.email.to_string(),
            password: user.password_hash.to_string(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        self.record_call();
        self.state
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| AppError::not_found("User", email))
    }
}

#[async_trait]
impl SessionStore for MemoryRepository {
    async fn save_session(&self, session: NewSession<'_>) -> Result<Session, AppError> {
        self.record_call();
        let mut state = self.state.lock();
        if !state.users.contains_key(&session.user_id) {
            return Err(AppError::Unavailable(format!(
                "sessions.user_id references missing user {}",
                session.user_id
            )));
        }
        if state.sessions.contains_key(session.token) {
            return Err(AppError::Unavailable(
                "duplicate key value violates unique constraint on sessions.token".to_string(),
            ));
        }
        let id = State::next_id(&mut state.next_session_id);
        let session = Session {
            id,
            user_id: session.user_id,
            token: session.token.to_string(),
            ip: session.ip.to_string(),
            user_agent: session.user_agent.to_string(),
            created_at: Utc::now(),
        };
        state.sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_user_id_by_token(&self, token: &str) -> Result<i64, AppError> {
        self.record_call();
        self.state
            .lock()
            .sessions
            .get(token)
            .map(|s| s.user_id)
            .ok_or_else(|| AppError::Unauthenticated("Invalid session token".to_string()))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> NewBook<'static> {
        NewBook {
            title: "Dune",
            year: 1965,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn saved_book_reads_back() {
        let repo = MemoryRepository::new();
        let saved = repo.save_book(dune()).await.unwrap();
        assert_eq!(repo.get_book(saved.id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn ids_are_generated_sequentially() {
        let repo = MemoryRepository::new();
        let first = repo.save_book(dune()).await.unwrap();
        let second = repo.save_book(dune()).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let repo = MemoryRepository::new();
        assert!(matches!(
            repo.get_book(99).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = MemoryRepository::new();
        let saved = repo.save_book(dune()).await.unwrap();
        assert!(repo.delete_book(saved.id).await.is_ok());
        assert!(repo.delete_book(saved.id).await.is_ok());
        assert!(repo.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_changes_title_and_year_only() {
        let repo = MemoryRepository::new();
        let saved = repo
            .save_book(NewBook {
                user_id: Some(7),
                ..dune()
            })
            .await
            .unwrap();
        let update = Book {
            id: saved.id,
            title: "Dune Messiah".to_string(),
            year: 1969,
            user_id: None,
        };
        repo.update_book(&update).await.unwrap();

        let stored = repo.get_book(saved.id).await.unwrap();
        assert_eq!(stored.title, "Dune Messiah");
        assert_eq!(stored.year, 1969);
        assert_eq!(stored.user_id, Some(7));
    }

    #[tokio::test]
    async fn update_of_missing_book_succeeds_silently() {
        let repo = MemoryRepository::new();
        let ghost = Book {
            id: 42,
            title: "Ghost".to_string(),
            year: 2000,
            user_id: None,
        };
        assert!(repo.update_book(&ghost).await.is_ok());
        assert!(repo.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = MemoryRepository::new();
        let user = NewUser {
            email: "a@b.com",
            password_hash: "hash",
        };
        repo.save_user(user).await.unwrap();
        assert!(matches!(
            repo.save_user(user).await,
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn token_resolves_to_owner() {
        let repo = MemoryRepository::new();
        let user = repo
            .save_user(NewUser {
                email: "a@b.com",
                password_hash: "hash",
            })
            .await
            .unwrap();
        repo.save_session(NewSession {
            user_id: user.id,
            token: "tok",
            ip: "127.0.0.1",
            user_agent: "",
        })
        .await
        .unwrap();

        assert_eq!(repo.get_user_id_by_token("tok").await.unwrap(), user.id);
        assert!(matches!(
            repo.get_user_id_by_token("nope").await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn calls_are_counted() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.calls(), 0);
        repo.list_books().await.unwrap();
        repo.save_book(dune()).await.unwrap();
        assert_eq!(repo.calls(), 2);
    }
}
