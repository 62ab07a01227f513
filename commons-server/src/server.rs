//! Main server implementation.
//!
//! Loads configuration, provisions the configured organizations and runs
//! the API until a shutdown signal arrives.

#![allow(clippy::used_underscore_binding)]

use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use commons_api::{ApiServer, AppState};
use commons_core::config::{ConfigLoader, Validatable};
use commons_security::scope::MemoryStore;
use commons_security::tenant::{HostResolver, InMemoryDirectory, OrganizationDirectory};
use commons_telemetry::logging::{LogConfig, LogFormat, init_logging};

use crate::config::AppConfig;
use crate::shutdown::{ShutdownController, setup_signal_handlers};

/// Lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not initialized, or fully stopped.
    Stopped,
    /// Initialized and ready to run.
    Starting,
    /// Serving requests.
    Running,
    /// Draining in-flight requests.
    ShuttingDown,
}

/// The Commons server.
pub struct CommonsServer {
    config: AppConfig,
    state: Arc<RwLock<ServerState>>,
    shutdown: ShutdownController,
    app_state: Option<Arc<AppState>>,
    _log_guards: Vec<WorkerGuard>,
}

impl CommonsServer {
    /// Creates a stopped server.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ServerState::Stopped)),
            shutdown: ShutdownController::new(),
            app_state: None,
            _log_guards: Vec::new(),
        }
    }

    /// Loads, overrides and validates a configuration file.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ServerError> {
        let mut config: AppConfig = ConfigLoader::new()
            .load_file(path)
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        config.apply_env_overrides();
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        Ok(config)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the lifecycle state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Returns the shutdown controller.
    #[must_use]
    pub const fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Initializes logging and the application state.
    pub async fn initialize(&mut self) -> Result<(), ServerError> {
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Stopped {
                return Err(ServerError::InvalidState(
                    "Server must be stopped to initialize".to_string(),
                ));
            }
            *state = ServerState::Starting;
        }

        self.init_logging()?;
        info!("Initializing Commons server");

        self.app_state = Some(self.build_app_state().await?);

        info!(
            base_domain = %self.config.commons.tenancy.base_domain,
            organizations = self.config.organizations.len(),
            "Commons server initialized"
        );
        Ok(())
    }

    fn init_logging(&mut self) -> Result<(), ServerError> {
        let logging = &self.config.commons.logging;
        let mut log_config = LogConfig::default()
            .with_level(&logging.level)
            .with_format(logging.format.parse().unwrap_or(LogFormat::Json));
        if let Some(dir) = &logging.file_dir {
            log_config = log_config.with_file_output(dir);
        }

        self._log_guards = init_logging(&log_config).map_err(|e| {
            ServerError::InitializationError(format!("Failed to initialize logging: {e}"))
        })?;
        Ok(())
    }

    /// Builds the application state and provisions the configured organizations.
    pub async fn build_app_state(&self) -> Result<Arc<AppState>, ServerError> {
        let tenancy = &self.config.commons.tenancy;
        let hosts = HostResolver::new(tenancy);
        let directory = Arc::new(InMemoryDirectory::new());

        for seed in &self.config.organizations {
            let org = seed
                .to_organization(&hosts, &tenancy.verification_token_prefix)
                .map_err(|reason| {
                    ServerError::ConfigError(format!("organization '{}': {reason}", seed.slug))
                })?;
            directory
                .insert(org)
                .await
                .map_err(|e| ServerError::ConfigError(format!("organization '{}': {e}", seed.slug)))?;
        }

        Ok(Arc::new(AppState::new(
            self.config.api.clone(),
            tenancy.clone(),
            directory,
            Arc::new(MemoryStore::new()),
        )))
    }

    /// Serves requests until shutdown, then drains within the shutdown timeout.
    pub async fn run(&self) -> Result<(), ServerError> {
        let app_state = {
            let mut state = self.state.write().await;
            let Some(app_state) = self.app_state.clone().filter(|_| *state == ServerState::Starting)
            else {
                return Err(ServerError::InvalidState(
                    "Server must be initialized before running".to_string(),
                ));
            };
            *state = ServerState::Running;
            app_state
        };

        let signals = self.shutdown.clone();
        tokio::spawn(setup_signal_handlers(signals));

        let shutdown = self.shutdown.clone();
        let api = ApiServer::new(self.config.bind_address(), app_state);
        let mut serving = tokio::spawn(api.run_with_shutdown(async move {
            shutdown.wait_for_shutdown().await;
        }));

        info!(address = %self.config.bind_address(), "Commons server running");

        tokio::select! {
            joined = &mut serving => {
                *self.state.write().await = ServerState::Stopped;
                return joined
                    .map_err(|e| ServerError::RuntimeError(e.to_string()))?
                    .map_err(|e| ServerError::RuntimeError(e.to_string()));
            }
            () = self.shutdown.wait_for_shutdown() => {}
        }

        *self.state.write().await = ServerState::ShuttingDown;
        let timeout = self.config.shutdown.timeout();
        match tokio::time::timeout(timeout, &mut serving).await {
            Ok(joined) => joined
                .map_err(|e| ServerError::RuntimeError(e.to_string()))?
                .map_err(|e| ServerError::RuntimeError(e.to_string()))?,
            Err(_) => {
                warn!(?timeout, "Requests still in flight after shutdown timeout");
                serving.abort();
            }
        }

        *self.state.write().await = ServerState::Stopped;
        info!("Graceful shutdown complete");
        Ok(())
    }

    /// Requests shutdown.
    pub fn shutdown(&self) {
        self.shutdown.initiate_shutdown();
    }
}

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Startup failed.
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// Operation not allowed in the current lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The API server failed.
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}
