//! Serve-until-interrupted state machine.
//!
//! # States
//! ```text
//! Starting      register the interrupt handler, then spawn the serve task
//!     ↓
//! Running       wait for a shutdown trigger (or an unexpected listener exit)
//!     ↓
//! ShuttingDown  stop accepting, drain in-flight requests until the deadline
//!     ↓
//! Stopped       outcome logged, control returned to the caller
//! ```
//!
//! # Design Decisions
//! - The shutdown receiver is subscribed at construction, before anything can trigger it
//! - Requests still running at the deadline are abandoned
//! - Tracer teardown is the caller's job once `run` returns

use std::io;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinError;

use crate::config::schema::DEFAULT_SHUTDOWN_TIMEOUT;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;

/// Fatal listener-level failures.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("listener failed: {0}")]
    Listener(#[from] io::Error),

    #[error("failed to listen for interrupt signal: {0}")]
    Signal(#[source] io::Error),

    #[error("listener stopped without a shutdown request")]
    ListenerExited,

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Runs a router until interrupted, then shuts it down gracefully.
#[derive(Debug)]
pub struct Supervisor {
    shutdown: Shutdown,
    stop: broadcast::Receiver<()>,
    shutdown_timeout: Duration,
}

impl Supervisor {
    pub fn new(shutdown_timeout: Duration) -> Self {
        let shutdown = Shutdown::new();
        let stop = shutdown.subscribe();
        Self {
            shutdown,
            stop,
            shutdown_timeout,
        }
    }

    /// Handle that stops the supervisor exactly like an interrupt does.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Serve `router` on `listener` until a shutdown trigger arrives.
    ///
    /// Returns `Ok` after a graceful or timed-out shutdown; returns an error
    /// when the interrupt handler cannot be registered or the listener fails
    /// on its own.
    pub async fn run(self, router: Router, listener: TcpListener) -> Result<(), RunError> {
        let mut stop = self.stop;
        let address = listener.local_addr()?;
        let (drain_tx, drain_rx) = oneshot::channel::<()>();

        // Starting
        let interrupt =
            signals::forward_interrupt(self.shutdown.clone()).map_err(RunError::Signal)?;
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = drain_rx.await;
                })
                .await
        });

        tracing::info!(address = %address, "HTTP server starting");

        // Running
        let exited = tokio::select! {
            result = &mut server => Some(result),
            _ = stop.recv() => None,
        };
        if let Some(result) = exited {
            interrupt.abort();
            tracing::error!("HTTP server stopped unexpectedly");
            return match result {
                Ok(Ok(())) => Err(RunError::ListenerExited),
                Ok(Err(err)) => Err(RunError::Listener(err)),
                Err(err) => Err(RunError::Task(err)),
            };
        }

        // ShuttingDown
        tracing::info!(
            timeout_secs = self.shutdown_timeout.as_secs_f64(),
            "Shutting down HTTP server"
        );
        let _ = drain_tx.send(());

        // Stopped
        match tokio::time::timeout(self.shutdown_timeout, &mut server).await {
            Ok(Ok(Ok(()))) => tracing::info!("HTTP server stopped"),
            Ok(Ok(Err(err))) => tracing::error!(error = %err, "Error shutting down HTTP server"),
            Ok(Err(err)) => tracing::error!(error = %err, "HTTP server task failed during shutdown"),
            Err(_) => {
                tracing::warn!("Shutdown deadline exceeded, abandoning in-flight requests");
                server.abort();
            }
        }
        interrupt.abort();

        Ok(())
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}
