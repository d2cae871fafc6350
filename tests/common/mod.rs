#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use http::{Request, Response};
use http_body_util::BodyExt;
use library_db::MemoryRepository;
use library_service::core::ServiceContext;
use library_service::services::{LibraryService, SessionService};
use library_service::startup::{App, AppOptions, build_app};
use serde_json::Value;
use tower::ServiceExt;

pub const OPTIONS: AppOptions = AppOptions {
    storage_timeout: Duration::from_secs(5),
    request_timeout: Duration::from_secs(5),
    grpc_reflection: false,
};

/// Routers over a fresh in-memory repository.
pub async fn app() -> (Arc<MemoryRepository>, App) {
    let repo = Arc::new(MemoryRepository::new());
    let app = build_app(repo.clone(), OPTIONS, library_telemetry::detached_metrics())
        .await
        .unwrap();
    (repo, app)
}

/// Library service over a fresh in-memory repository, for direct gRPC trait calls.
pub fn library() -> (Arc<MemoryRepository>, LibraryService) {
    let repo = Arc::new(MemoryRepository::new());
    let ctx = Arc::new(ServiceContext::new(repo.clone(), OPTIONS.storage_timeout));
    let sessions = Arc::new(SessionService::new(ctx.clone()));
    (repo, LibraryService::new(ctx, sessions))
}

pub async fn send(app: &App, request: Request<Body>) -> Response<Body> {
    app.rest.clone().oneshot(request).await.unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
