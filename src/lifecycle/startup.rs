//! Startup orchestration.
//!
//! # Responsibilities
//! - Install tracing, logging and metrics in dependency order
//! - Assemble the router around the service's routes
//! - Bind the listener and hand over to the [`Supervisor`]
//! - Run the tracer teardown after the listener has stopped
//!
//! # Design Decisions
//! - Fail fast: any setup error is returned before a socket is bound
//! - Errors are returned, never turned into a process exit here; the binary decides
//! - Teardown runs exactly once, even when the listener fails

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::server::{build_router, RouteError};
use crate::lifecycle::supervisor::{RunError, Supervisor};
use crate::observability::logging::{init_subscriber, Logger};
use crate::observability::metrics::install_recorder;
use crate::observability::tracing::{setup_tracing, Teardown, TracingError};

/// Fatal errors raised while assembling the service.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to set up tracing: {0}")]
    Tracing(#[from] TracingError),

    #[error("failed to assemble router: {0}")]
    Router(#[from] RouteError),
}

/// Any fatal error of a service run.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Run(#[from] RunError),
}

/// Output of [`Service::setup`].
pub struct Setup {
    /// Fully wired router, ready to serve.
    pub router: Router,

    /// Process-level logger bound to the service name.
    pub logger: Logger,

    /// Tracer teardown, to run once the listener has stopped.
    pub teardown: Teardown,
}

/// One HTTP service instance.
///
/// Only one service should be set up per process: tracer provider,
/// propagator, subscriber and metrics recorder are process-wide.
#[derive(Debug, Clone)]
pub struct Service {
    config: Arc<ServiceConfig>,
}

impl Service {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Install telemetry and assemble the router around `routes`.
    pub fn setup(&self, routes: Router) -> Result<Setup, SetupError> {
        let tracer = setup_tracing(&self.config)?;
        init_subscriber(tracer.tracer().clone());

        let logger = Logger::new(&self.config.name);
        let router = build_router(&self.config, routes, logger.clone(), install_recorder())?;

        tracing::info!(
            service = %self.config.name,
            health_path = %self.config.health_path,
            metrics_path = %self.config.metrics_path,
            sample_rate = self.config.otel_sample_rate,
            "Service configured"
        );

        Ok(Setup {
            router,
            logger,
            teardown: tracer.into_teardown(),
        })
    }

    /// Set up, serve on the configured address until interrupted, tear down.
    pub async fn run(self, routes: Router) -> Result<(), ServiceError> {
        let Setup {
            router, teardown, ..
        } = self.setup(routes)?;

        let result = self.serve(router).await;
        teardown.run().await;

        tracing::info!(service = %self.config.name, "Shutdown complete");
        result.map_err(ServiceError::from)
    }

    async fn serve(&self, router: Router) -> Result<(), RunError> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|source| RunError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })?;

        Supervisor::new(self.config.shutdown_timeout)
            .run(router, listener)
            .await
    }
}
