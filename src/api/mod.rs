//! HTTP API: read-only JSON endpoints over the shared store

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{InfraError, InfraResult};

pub use error::{ApiError, ErrorResponse};
pub use handlers::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/admin-divs/", get(handlers::list_admin_divs))
        .route("/api/admin-divs/options/", get(handlers::admin_div_options))
        .route("/api/admin-divs/{id}/", get(handlers::get_admin_div))
        .route("/api/customer/{id}/", get(handlers::get_customer))
        .with_state(state)
}

/// Serve the API on `addr` until ctrl-c.
pub async fn serve(container: Arc<ServiceContainer>, addr: &str) -> InfraResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| InfraError::io(format!("bind {addr}"), e))?;
    info!("listening on {addr}");

    axum::serve(listener, router(container))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {e}");
            }
            info!("shutting down");
        })
        .await
        .map_err(|e| InfraError::Server {
            message: e.to_string(),
        })
}
