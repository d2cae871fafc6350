//! Deadline enforcement for the gRPC listener.
//!
//! Reads the caller's `grpc-timeout` header, caps it at the server-wide
//! request timeout and drops the call when it expires, answering with
//! `DEADLINE_EXCEEDED`. Dropping the call drops any in-flight storage future.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use http::{Request, Response};
use tonic::Status;
use tower::{Layer, Service};
use tracing::warn;

/// Header carrying the client deadline.
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Layer bounding every gRPC call by the client deadline or `max`.
#[derive(Debug, Clone, Copy)]
pub struct GrpcDeadlineLayer {
    max: Duration,
}

impl GrpcDeadlineLayer {
    #[must_use]
    pub const fn new(max: Duration) -> Self {
        Self { max }
    }
}

impl<S> Layer<S> for GrpcDeadlineLayer {
    type Service = GrpcDeadline<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GrpcDeadline {
            inner,
            max: self.max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GrpcDeadline<S> {
    inner: S,
    max: Duration,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for GrpcDeadline<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let deadline = effective_deadline(&req, self.max);
        let path = req.uri().path().to_owned();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match tokio::time::timeout(deadline, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(path = %path, deadline_ms = deadline.as_millis(), "gRPC deadline exceeded");
                    Ok(Status::deadline_exceeded("Deadline exceeded").into_http())
                }
            }
        })
    }
}

/// The client deadline if present and shorter than `max`, otherwise `max`.
fn effective_deadline<T>(req: &Request<T>, max: Duration) -> Duration {
    req.headers()
        .get(GRPC_TIMEOUT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_grpc_timeout)
        .map_or(max, |client| client.min(max))
}

/// Parse a `grpc-timeout` value: up to eight digits followed by a unit.
fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "H" => Some(Duration::from_secs(amount * 3600)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}
