//! Database models and parameter types for the library schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =============================================================================
// Models (own their data)
// =============================================================================

/// Catalog entry from `books`.
///
/// `year` is stored in the `year_book` column.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Registered account from `users`.
///
/// `password` holds the Argon2id PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
}

/// Login session from `sessions`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub ip: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Parameter types (borrow from caller)
// =============================================================================

/// Parameters for inserting a book. The id is assigned by storage.
#[derive(Debug, Clone, Copy)]
pub struct NewBook<'a> {
    pub title: &'a str,
    pub year: i32,
    pub user_id: Option<i64>,
}

/// Parameters for inserting a user. The id is assigned by storage.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Parameters for inserting a session. Id and `created_at` are assigned by storage.
#[derive(Debug, Clone, Copy)]
pub struct NewSession<'a> {
    pub user_id: i64,
    pub token: &'a str,
    pub ip: &'a str,
    pub user_agent: &'a str,
}
