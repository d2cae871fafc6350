//! Library service: gRPC + REST book catalog.

use std::net::SocketAddr;

use axum::Router;
use library_service::config::Config;
use library_service::startup::{self, AppOptions};
use library_telemetry::{init_metrics, setup_telemetry};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Build version (injected at compile time)
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::init()?;
    setup_telemetry(&config.telemetry_config());
    let metrics_handle = init_metrics()?;

    info!(
        version = VERSION,
        rest_address = %config.rest_address,
        grpc_address = %config.grpc_address,
        pid = std::process::id(),
        "Starting library-service"
    );

    let repo = startup::connect_repository(&config).await?;
    let app = startup::build_app(repo, AppOptions::from(&config), metrics_handle).await?;

    let rest_listener = TcpListener::bind(config.rest_addr()?).await?;
    let grpc_listener = TcpListener::bind(config.grpc_addr()?).await?;
    info!(address = %rest_listener.local_addr()?, "REST listening");
    info!(address = %grpc_listener.local_addr()?, "gRPC listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        startup::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    tokio::try_join!(
        serve(rest_listener, app.rest, shutdown_rx.clone()),
        serve(grpc_listener, app.grpc, shutdown_rx),
    )?;

    info!("Server shutdown complete");
    Ok(())
}

/// Serve `router` until the shutdown flag flips.
async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown.wait_for(|stop| *stop).await;
    })
    .await?;
    Ok(())
}
