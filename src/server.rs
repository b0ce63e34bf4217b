use crate::observability::MetricsSnapshot;
use crate::queue::StatusScope;
use crate::worker::QueueWorker;
use axum::extract::State;
use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub running: bool,
    pub pending: usize,
    pub metrics: MetricsSnapshot,
}

pub fn router(worker: QueueWorker) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .with_state(worker)
}

/// Serve the keep-alive endpoint until a shutdown signal arrives
pub async fn run(address: SocketAddr, worker: QueueWorker) -> Result<(), AnyError> {
    let listener = TcpListener::bind(address).await?;
    info!(%address, "Health server listening");

    axum::serve(listener, router(worker).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health(State(worker): State<QueueWorker>) -> impl IntoResponse {
    match worker.status(StatusScope::All) {
        Ok(status) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                running: status.running,
                pending: status.pending,
                metrics: worker.metrics().snapshot(),
            }),
        )
            .into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
