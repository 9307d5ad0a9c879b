//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Tracer provider → JSON subscriber → metrics recorder → router → bind
//!
//! Supervision (supervisor.rs):
//!     Serve task running → interrupt (signals.rs) → shutdown.rs trigger
//!     → stop accepting → drain in-flight requests (deadline) → return
//!
//! Teardown (startup.rs):
//!     After the supervisor returns → flush and close the tracer provider
//! ```
//!
//! # Design Decisions
//! - Ordered startup: telemetry first, then router, then listener
//! - Shutdown has a deadline: in-flight requests are abandoned after it
//! - Only SIGINT triggers the graceful path

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use startup::{Service, ServiceError, Setup, SetupError};
pub use supervisor::{RunError, Supervisor};
