//! Core library with shared types, traits, and error handling.
//!
//! This crate provides reusable components for the library services:
//! - Error taxonomy with automatic gRPC `Status` and HTTP status mapping
//! - Domain validation rules shared by the REST and gRPC adapters
//! - Bearer credential extraction from request metadata

pub mod error;
pub mod request_ext;
pub mod str_ext;
pub mod validation;

pub use error::{AppError, ErrorExt};
pub use request_ext::{BEARER_PREFIX, BearerExt, bearer_value};
pub use str_ext::canonical_email;
pub use validation::ValidateExt;
