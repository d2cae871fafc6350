//! Server startup and wiring.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use library_db::{Database, Repository, create_pool};
use library_proto::library::library_service_server::LibraryServiceServer;
use library_telemetry::PrometheusHandle;
use tonic::service::Routes;
use tonic_health::server::health_reporter;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, Span, info};

use crate::config::Config;
use crate::core::ServiceContext;
use crate::middleware::{
    ClientIpLayer, GrpcDeadlineLayer, MetricsLayer, RequestId, RequestIdLayer,
};
use crate::routes::{AppState, rest_routes};
use crate::services::{LibraryService, SessionService};

/// Maximum gRPC message size (4 MB).
const GRPC_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Runtime settings consumed while wiring the routers.
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub storage_timeout: Duration,
    pub request_timeout: Duration,
    pub grpc_reflection: bool,
}

impl From<&Config> for AppOptions {
    fn from(config: &Config) -> Self {
        Self {
            storage_timeout: config.storage_timeout(),
            request_timeout: config.request_timeout(),
            grpc_reflection: config.grpc_reflection,
        }
    }
}

/// The two routers served on separate listeners.
pub struct App {
    pub rest: Router,
    pub grpc: Router,
}

/// Connect to PostgreSQL and apply migrations when enabled.
pub async fn connect_repository(config: &Config) -> anyhow::Result<Arc<dyn Repository>> {
    let pool = create_pool(&config.db_config()).await?;
    info!("Connected to database");

    let database = Database::new(pool);
    if config.run_migrations {
        database.migrate().await?;
        info!("Database migrations applied");
    }

    Ok(Arc::new(database))
}

/// Build the REST and gRPC routers over `repo`.
pub async fn build_app(
    repo: Arc<dyn Repository>,
    options: AppOptions,
    metrics: PrometheusHandle,
) -> anyhow::Result<App> {
    let ctx = Arc::new(ServiceContext::new(repo.clone(), options.storage_timeout));
    let sessions = Arc::new(SessionService::new(ctx.clone()));
    let library = Arc::new(LibraryService::new(ctx, sessions));

    // Health reporter
    let (health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<LibraryServiceServer<LibraryService>>()
        .await;

    let library_server = LibraryServiceServer::from_arc(library.clone())
        .max_decoding_message_size(GRPC_MAX_MESSAGE_SIZE)
        .max_encoding_message_size(GRPC_MAX_MESSAGE_SIZE);

    let mut grpc_routes = Routes::new(health_service).add_service(library_server);

    if options.grpc_reflection {
        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(library_proto::FILE_DESCRIPTOR_SET)
            .build_v1()?;
        grpc_routes = grpc_routes.add_service(reflection);
        info!("gRPC reflection enabled");
    }

    let state = AppState {
        library,
        repo,
        metrics,
    };

    let rest = rest_routes(state).layer(
        ServiceBuilder::new()
            .layer(RequestIdLayer::new())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(request_span)
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
            )
            .layer(MetricsLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                options.request_timeout,
            ))
            .layer(ClientIpLayer),
    );

    let grpc = grpc_routes.into_axum_router().layer(
        ServiceBuilder::new()
            .layer(RequestIdLayer::new())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(request_span)
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
            )
            .layer(MetricsLayer::new())
            .layer(GrpcDeadlineLayer::new(options.request_timeout))
            .layer(ClientIpLayer),
    );

    Ok(App { rest, grpc })
}

/// Root span of every request, tagged with the propagated request ID.
fn request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = req.extensions().get::<RequestId>().map_or("", RequestId::as_str),
    )
}

/// Resolve on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
