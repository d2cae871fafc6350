//! Tower middleware shared by the REST and gRPC listeners.
//!
//! # Middleware Order
//! Layers added through `ServiceBuilder` run top to bottom on the request:
//! 1. `RequestIdLayer` - extract/generate request ID first
//! 2. `TraceLayer` - request span
//! 3. `MetricsLayer` - count and time the full call
//! 4. `TimeoutLayer` (REST) or `GrpcDeadlineLayer` (gRPC, honours `grpc-timeout`)
//! 5. `ClientIpLayer` - caller origin for session creation

pub mod client_ip;
pub mod grpc_deadline;
pub mod logger;
pub mod metrics;
pub mod request_id;

pub use client_ip::{ClientIp, ClientIpLayer};
pub use grpc_deadline::GrpcDeadlineLayer;
pub use logger::RequestLogger;
pub use metrics::MetricsLayer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
