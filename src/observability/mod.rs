//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request (except health/metrics probes, see filter.rs):
//!     → logging.rs (one JSON access record, request-scoped Logger)
//!     → metrics.rs (counters, histograms; probes included)
//!     → tracing.rs (server span parented on inbound trace context)
//!
//! Consumers:
//!     → stdout (JSON log records)
//!     → Metrics endpoint (Prometheus scrape)
//!     → OTLP collector (optional)
//!
//! OpenTelemetry SDK diagnostics:
//!     → diagnostics.rs (error records tagged tracer="opentelemetry")
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through logs, spans, and the response header
//! - Tracer provider, propagator, subscriber and recorder are process-wide

#[cfg(test)]
pub(crate) mod capture;
pub mod diagnostics;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod tracing;

pub use filter::{should_record, TelemetryFilter};
pub use logging::Logger;
pub use self::tracing::{setup_tracing, Teardown, TracerHandle, TracingError};
