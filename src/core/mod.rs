//! Service infrastructure: storage context and password hashing.

pub mod password;
mod service_context;

pub use service_context::ServiceContext;
