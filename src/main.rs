use std::sync::Arc;

use gophermart::accrual::{AccrualClient, ScoringWorker};
use gophermart::api::{self, AppState};
use gophermart::config::Config;
use gophermart::db::PgGateway;
use gophermart::engine::OrderEngine;
use gophermart::logging::init_logging;

use rand::RngCore;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::load();
    tracing::info!(address = %config.run_address, "starting gophermart");

    let gateway = PgGateway::connect(&config.database_uri).await?;
    let gateway = Arc::new(gateway);

    let engine = Arc::new(OrderEngine::new(Arc::clone(&gateway)));

    let mut jwt_secret = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut jwt_secret);

    let state = AppState::new(Arc::clone(&engine), jwt_secret);
    let app = api::build(state);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = ScoringWorker::new(gateway, AccrualClient::new(config.accrual_system_address.clone()));
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    let listener = tokio::net::TcpListener::bind(normalize_address(&config.run_address)).await?;
    tracing::info!(address = %config.run_address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    worker_handle.await?;

    Ok(())
}

/// Accepts the Go-style `:8081` shorthand in addition to a full host:port.
fn normalize_address(address: &str) -> String {
    if let Some(port) = address.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        address.to_string()
    }
}

/// Waits for SIGINT/SIGTERM (and SIGQUIT on unix), mirroring
/// `original_source/cmd/gophermart/main.go`'s signal set.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigquit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigquit.recv() => {},
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining in-flight work");
}
