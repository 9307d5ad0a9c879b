//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for the interrupt signal (SIGINT / Ctrl+C)
//! - Translate it into a [`Shutdown`] trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The handler is registered before returning, so an interrupt arriving
//!   right after startup is never left to the default handler
//! - Only the first interrupt is consumed; repeats are not escalated
//! - Other termination signals are not handled

use std::io;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Register the interrupt handler, then spawn a task that triggers
/// `shutdown` on the first interrupt.
///
/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn forward_interrupt(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    Ok(tokio::spawn(async move {
        if interrupt.recv().await.is_some() {
            tracing::info!("Interrupt received");
            shutdown.trigger();
        }
    }))
}

#[cfg(windows)]
pub fn forward_interrupt(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    let mut interrupt = tokio::signal::windows::ctrl_c()?;
    Ok(tokio::spawn(async move {
        if interrupt.recv().await.is_some() {
            tracing::info!("Interrupt received");
            shutdown.trigger();
        }
    }))
}
