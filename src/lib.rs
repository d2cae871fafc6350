//! Library service: book catalog over gRPC and REST with session-token
//! authentication, backed by PostgreSQL.

pub mod config;
pub mod core;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod startup;
