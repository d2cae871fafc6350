//! REST routes, error mapping and health check handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::{HeaderMap, HeaderValue, StatusCode, header};
use library_core::{AppError, BearerExt, ErrorExt, ValidateExt, bearer_value, validation};
use library_db::{Book, Repository};
use library_telemetry::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::middleware::{ClientIp, RequestLogger};
use crate::services::{BookInput, BookUpdate, Credentials, LibraryService};

/// Build version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<LibraryService>,
    pub repo: Arc<dyn Repository>,
    pub metrics: PrometheusHandle,
}

/// Build the REST router.
pub fn rest_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "library-service" }))
        .route("/health", get(|| async { "OK" }))
        .route("/health/live", get(|| async { "OK" }))
        .route("/health/ready", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/book",
            get(get_book)
                .post(add_book)
                .put(update_book)
                .delete(delete_book),
        )
        .route("/books", get(all_books))
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// [`AppError`] rendered as `{"error": "<message>"}` with the mapped status.
#[derive(Debug)]
pub struct RestError(pub AppError);

impl From<AppError> for RestError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for RestError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for RestError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid("query", rejection.body_text()))
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.0.http_status();
        (status, Json(json!({ "error": self.0.public_message() }))).into_response()
    }
}

type RestResult<T> = Result<T, RestError>;

// ============================================================================
// Book catalog
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct IdQuery {
    id: Option<String>,
}

impl IdQuery {
    fn id(&self) -> Result<i64, AppError> {
        self.id
            .as_deref()
            .map(str::trim)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| AppError::invalid("id", "Invalid id parameter"))
    }
}

#[derive(Debug, Default, Deserialize)]
struct LimitQuery {
    limit: Option<String>,
}

async fn get_book(
    State(state): State<AppState>,
    log: RequestLogger,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> RestResult<Json<Book>> {
    let id = query?.id()?;
    Ok(Json(state.library.get_book(&log, id).await?))
}

/// Create a book. A supplied bearer must resolve and makes the caller the owner.
async fn add_book(
    State(state): State<AppState>,
    log: RequestLogger,
    headers: HeaderMap,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> RestResult<Json<Book>> {
    let Json(input) = payload?;
    input.validate()?;
    let owner = if headers.has_authorization() {
        Some(state.library.sessions().authenticate(&headers).await?)
    } else {
        None
    };
    Ok(Json(state.library.add_book(&log, &input, owner).await?))
}

async fn update_book(
    State(state): State<AppState>,
    log: RequestLogger,
    payload: Result<Json<BookUpdate>, JsonRejection>,
) -> RestResult<StatusCode> {
    let Json(update) = payload?;
    state.library.update_book(&log, &update).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_book(
    State(state): State<AppState>,
    log: RequestLogger,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> RestResult<StatusCode> {
    let id = query?.id()?;
    state.library.delete_book(&log, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn all_books(
    State(state): State<AppState>,
    log: RequestLogger,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> RestResult<Json<Vec<Book>>> {
    let limit = validation::parse_limit(query?.limit.as_deref())?;
    Ok(Json(state.library.all_books(&log, limit).await?))
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Serialize)]
struct UserBody {
    id: i64,
    email: String,
}

#[derive(Serialize)]
struct LoginBody {
    user_id: i64,
}

async fn register(
    State(state): State<AppState>,
    log: RequestLogger,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> RestResult<Json<UserBody>> {
    let Json(credentials) = payload?;
    let user = state.library.sessions().register(&log, &credentials).await?;
    Ok(Json(UserBody {
        id: user.id,
        email: user.email,
    }))
}

/// Log in; the session token is returned in the `Authorization` header.
async fn login(
    State(state): State<AppState>,
    log: RequestLogger,
    client_ip: Option<Extension<ClientIp>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> RestResult<impl IntoResponse> {
    let Json(credentials) = payload?;
    let origin = client_ip.map(|Extension(ip)| ip).unwrap_or_default();
    let outcome = state
        .library
        .sessions()
        .login(&log, &credentials, origin)
        .await?;

    let authorization = HeaderValue::from_str(&bearer_value(&outcome.token))
        .internal("Failed to encode session token")?;

    Ok((
        [(header::AUTHORIZATION, authorization)],
        Json(LoginBody {
            user_id: outcome.user_id,
        }),
    ))
}

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    checks: HealthChecks,
}

#[derive(Serialize)]
struct HealthChecks {
    database: CheckResult,
}

#[derive(Serialize)]
struct CheckResult {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl CheckResult {
    const fn healthy() -> Self {
        Self {
            status: "healthy",
            message: None,
        }
    }

    fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            message: Some(message.into()),
        }
    }
}

async fn readiness_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = if state.repo.health_check().await {
        (StatusCode::OK, CheckResult::healthy())
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            CheckResult::unhealthy("Database connection failed"),
        )
    };

    (
        status,
        Json(HealthResponse {
            status: database.status,
            version: VERSION,
            checks: HealthChecks { database },
        }),
    )
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}
