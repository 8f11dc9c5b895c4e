//! HTTP front end for the diff analysis pipeline.
//!
//! Exposes `GET /` for liveness and `POST /analyze`, which takes a caller's
//! key plus a list of file diffs and answers with a SARIF report.

mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use diffsarif_core::DiffSarifError;
use tokio::net::TcpListener;
use tokio::signal;

pub use error::{AppError, AppResult};
pub use routes::analyze_request::{AnalyzeRequest, AnalyzeResponse, FileEntry};
pub use state::AppState;

use crate::routes::{analyze_route::analyze_route, health_route::health_route};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_route))
        .route("/analyze", post(analyze_route))
        .with_state(Arc::new(state))
}

/// Serve on an already bound listener until Ctrl+C.
///
/// # Errors
///
/// Returns [`DiffSarifError::Io`] if the server fails while running.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), DiffSarifError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Bind `addr` and serve until Ctrl+C.
///
/// # Errors
///
/// Returns [`DiffSarifError::Io`] if the address cannot be bound.
pub async fn bind_and_serve(addr: &str, state: AppState) -> Result<(), DiffSarifError> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
