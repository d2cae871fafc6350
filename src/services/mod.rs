//! Domain services.
//!
//! - `auth` - registration, login and bearer-token resolution
//! - `library` - book catalog operations and the gRPC trait implementation

mod auth;
mod library;

pub use auth::{Credentials, LoginOutcome, SessionService};
pub use library::{BookInput, BookUpdate, LibraryService};
