//! Bootstrap layer for HTTP services.
//!
//! Wraps a service's axum routes with uniform observability (JSON access
//! logs, request IDs, panic recovery, OpenTelemetry spans, Prometheus
//! metrics) and runs them until interrupted, shutting down gracefully.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use service_kit::{Service, ServiceConfig};
//!
//! # async fn run() -> Result<(), service_kit::ServiceError> {
//! let config = ServiceConfig::builder("orders").sample_rate(0.5).build();
//! let routes = Router::new().route("/orders", get(|| async { "[]" }));
//! Service::new(config).run(routes).await
//! # }
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{ServiceConfig, ServiceOption};
pub use http::HttpError;
pub use lifecycle::{Service, ServiceError, Setup, Shutdown, Supervisor};
pub use observability::{Logger, Teardown};
