//! API server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::routes::create_router;
use crate::state::AppState;

/// API server.
pub struct ApiServer {
    bind_address: String,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server that will listen on `bind_address` (`host:port`).
    #[must_use]
    pub fn new(bind_address: impl Into<String>, state: Arc<AppState>) -> Self {
        Self {
            bind_address: bind_address.into(),
            state,
        }
    }

    /// Returns the listen address.
    #[must_use]
    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    async fn bind(&self) -> Result<TcpListener, ApiError> {
        let addr: SocketAddr = self
            .bind_address
            .parse()
            .map_err(|e| ApiError::Internal(format!("Invalid bind address: {e}")))?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            ApiError::Internal(format!("Failed to bind to {}: {e}", self.bind_address))
        })?;

        info!(address = %self.bind_address, "API server listening");
        Ok(listener)
    }

    /// Runs the API server until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or run.
    pub async fn run(self) -> Result<(), ApiError> {
        let listener = self.bind().await?;
        let app = create_router(self.state);

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {e}")))
    }

    /// Runs the API server until `shutdown_signal` completes, then drains
    /// in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or run.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ApiError> {
        let listener = self.bind().await?;
        let app = create_router(self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {e}")))?;

        warn!("API server shut down");
        Ok(())
    }
}
