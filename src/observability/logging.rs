//! Structured logging.
//!
//! # Responsibilities
//! - Install the JSON subscriber on stdout, bridged to the tracer
//! - Forward OpenTelemetry SDK diagnostics into the same log (see diagnostics.rs)
//! - Provide the [`Logger`] handle and its request-scoped derivative
//! - Emit one access record per request (probe paths excluded)
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Level `info` unless `RUST_LOG` overrides it
//! - Request-scoped records carry the request ID under the `id` field

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use opentelemetry_sdk::trace::Tracer;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::http::request::RequestIdExt;
use crate::observability::diagnostics::{is_sdk_diagnostic, DiagnosticFormat};
use crate::observability::filter::TelemetryFilter;

/// Filter directive used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the process-wide JSON subscriber with the OpenTelemetry bridge.
///
/// Returns false when a subscriber was already installed; the existing one
/// stays in place.
pub fn init_subscriber(tracer: Tracer) -> bool {
    let result = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into()),
        )
        .with(log_layers(std::io::stdout))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init();

    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "Global subscriber already installed");
            false
        }
    }
}

/// JSON record layers writing to `writer`.
///
/// Service records use the standard JSON format; SDK diagnostics are
/// rendered by [`DiagnosticFormat`] instead.
pub fn log_layers<S, W>(writer: W) -> impl Layer<S> + Send + Sync + 'static
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let records = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer.clone())
        .with_current_span(true)
        .with_span_list(false)
        .with_filter(filter_fn(|metadata| !is_sdk_diagnostic(metadata)));

    let diagnostics = tracing_subscriber::fmt::layer()
        .event_format(DiagnosticFormat)
        .with_writer(writer)
        .with_filter(filter_fn(is_sdk_diagnostic));

    records.and_then(diagnostics)
}

/// Logging handle bound to a service, optionally scoped to one request.
#[derive(Debug, Clone)]
pub struct Logger {
    service: Arc<str>,
    request_id: Option<Arc<str>>,
}

impl Logger {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.into(),
            request_id: None,
        }
    }

    /// Derive a logger whose records carry `id = request_id`.
    pub fn with_request_id(&self, request_id: &str) -> Self {
        Self {
            service: self.service.clone(),
            request_id: Some(request_id.into()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(service = %self.service, id = self.request_id(), "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(service = %self.service, id = self.request_id(), "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(service = %self.service, id = self.request_id(), "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(service = %self.service, id = self.request_id(), "{}", message);
    }
}

/// Handlers take the request-scoped logger as an extractor.
impl<S> FromRequestParts<S> for Logger
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Logger>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Request logger middleware not installed",
        ))
    }
}

/// Middleware placing the request-scoped logger into the request extensions.
pub async fn attach_request_logger(
    State(logger): State<Logger>,
    mut request: Request,
    next: Next,
) -> Response {
    let scoped = logger.with_request_id(request.request_id().unwrap_or_default());
    request.extensions_mut().insert(scoped);
    next.run(request).await
}

/// Middleware emitting one access record per request.
pub async fn log_requests(
    State(filter): State<TelemetryFilter>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request.request_id().unwrap_or_default().to_owned();

    let response = next.run(request).await;

    if !filter.should_record(&path) {
        return response;
    }

    let status = response.status();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    if status.is_server_error() {
        tracing::error!(id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Request rejected");
    } else {
        tracing::info!(id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Request handled");
    }

    response
}
