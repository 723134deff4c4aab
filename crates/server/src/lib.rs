//! HTTP API for profile-scout
//!
//! Routes live under `/api/v1`. Every response is wrapped in
//! `{ "data": ..., "meta": { "request_id", "timestamp" } }`; errors use
//! `{ "error": { "code", "message" }, "meta": ... }`.

pub mod api;
pub mod middleware;

use std::future::Future;

pub use api::{AppState, ServerUseCase, build_app};
pub use middleware::AuthState;

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    auth: AuthState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, auth = auth.enabled(), "Serving profile-scout API");

    axum::serve(listener, build_app(state, auth))
        .with_graceful_shutdown(shutdown)
        .await
}
