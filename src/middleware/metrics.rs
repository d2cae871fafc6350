//! Request metrics for both listeners.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `http_requests_total` | Counter | `method`, `path`, `status` |
//! | `http_request_duration_seconds` | Histogram | `method`, `path`, `status` |
//!
//! gRPC paths are the full method (`/library.v1.LibraryService/AddBook`) and
//! the status is `grpc-status` when it appears in headers. REST paths outside
//! the known route set are reported as `/*`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http::{Request, Response};
use tower::{Layer, Service};

/// REST routes reported verbatim.
const KNOWN_REST_PATHS: &[&str] = &[
    "/",
    "/book",
    "/books",
    "/register",
    "/login",
    "/health",
    "/health/live",
    "/health/ready",
    "/metrics",
];

#[derive(Clone, Copy, Default)]
pub struct MetricsLayer;

impl MetricsLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let method = req.method().to_string();
        let is_grpc = req
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/grpc"));

        let path = if is_grpc {
            req.uri().path().to_string()
        } else {
            normalize_rest_path(req.uri().path())
        };

        let start = Instant::now();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            let duration = start.elapsed().as_secs_f64();

            let http_status = response.status().as_u16().to_string();
            let status = if is_grpc {
                response
                    .headers()
                    .get("grpc-status")
                    .and_then(|v| v.to_str().ok())
                    .map_or(http_status, str::to_string)
            } else {
                http_status
            };

            let labels = [("method", method), ("path", path), ("status", status)];
            metrics::counter!("http_requests_total", &labels).increment(1);
            metrics::histogram!("http_request_duration_seconds", &labels).record(duration);

            Ok(response)
        })
    }
}

fn normalize_rest_path(path: &str) -> String {
    if KNOWN_REST_PATHS.contains(&path) {
        path.to_string()
    } else {
        "/*".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_rest_paths_pass_through() {
        assert_eq!(normalize_rest_path("/book"), "/book");
        assert_eq!(normalize_rest_path("/health/ready"), "/health/ready");
        assert_eq!(normalize_rest_path("/login"), "/login");
    }

    #[test]
    fn unknown_rest_paths_bucketed() {
        assert_eq!(normalize_rest_path("/book/42"), "/*");
        assert_eq!(normalize_rest_path("/admin"), "/*");
    }
}
