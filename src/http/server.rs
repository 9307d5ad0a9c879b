//! Router assembly.
//!
//! # Responsibilities
//! - Register the health and metrics endpoints next to the service's routes
//! - Wire the middleware chain in a fixed order
//!
//! # Middleware Order (outermost first)
//! ```text
//! set x-request-id → propagate x-request-id → access log → metrics
//!     → span → catch panic → request-scoped logger → handler
//! ```
//!
//! # Design Decisions
//! - Request ID is assigned before the access log, so the logged ID, the span
//!   attribute, the request logger and the response header all agree
//! - Panic recovery sits inside the span, access log and metrics layers so they
//!   all observe the 500 and the span records the panic
//! - Chain is fixed at assembly time; routes added afterwards are not wrapped

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::config::ServiceConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::handle_panic;
use crate::observability::filter::TelemetryFilter;
use crate::observability::logging::{attach_request_logger, log_requests, Logger};
use crate::observability::metrics::{render_metrics, track_metrics};
use crate::observability::tracing::trace_requests;

/// Body returned by the health endpoint.
pub const HEALTH_BODY: &str = "OK";

/// Endpoint paths that axum cannot register.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("endpoint path must start with '/': {0:?}")]
    InvalidPath(String),

    #[error("health and metrics endpoints share the path {0:?}")]
    DuplicatePath(String),
}

/// Assemble the service router around the caller's `routes`.
pub fn build_router(
    config: &ServiceConfig,
    routes: Router,
    logger: Logger,
    metrics: PrometheusHandle,
) -> Result<Router, RouteError> {
    for path in [&config.health_path, &config.metrics_path] {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path.clone()));
        }
    }
    if config.health_path == config.metrics_path {
        return Err(RouteError::DuplicatePath(config.health_path.clone()));
    }

    let filter = TelemetryFilter::new(&config.health_path, &config.metrics_path);

    let middleware = ServiceBuilder::new()
        .layer(set_request_id_layer())
        .layer(propagate_request_id_layer())
        .layer(from_fn_with_state(filter.clone(), log_requests))
        .layer(from_fn(track_metrics))
        .layer(from_fn_with_state(filter, trace_requests))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(logger, attach_request_logger));

    Ok(routes
        .route(&config.metrics_path, get(render_metrics).with_state(metrics))
        .route(&config.health_path, get(health))
        .layer(middleware))
}

async fn health() -> &'static str {
    HEALTH_BODY
}
