//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the tracer provider (ratio sampler, service identity, optional OTLP exporter)
//! - Install it and the W3C trace-context + baggage propagator process-wide
//! - Hand back a [`Teardown`] that flushes and closes the provider
//! - Open a server span per request, parented on the inbound trace context
//!
//! # Design Decisions
//! - Exactly one provider per process: a second setup replaces the first globally
//! - Teardown failures are logged and swallowed; they happen during exit
//! - Probe paths get no span at all

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use opentelemetry::global;
use opentelemetry::propagation::{Extractor, TextMapCompositePropagator};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing::{field, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::ServiceConfig;
use crate::http::response::HandlerError;
use crate::http::request::{matched_route, RequestIdExt};
use crate::observability::filter::TelemetryFilter;

/// Errors raised while installing the tracer provider.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to build OTLP span exporter for {endpoint}: {reason}")]
    Exporter { endpoint: String, reason: String },
}

/// Owns the process-wide tracer provider.
pub struct TracerHandle {
    provider: TracerProvider,
    tracer: Tracer,
}

impl TracerHandle {
    /// Tracer bound to the service name, for the `tracing` bridge layer.
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn into_teardown(self) -> Teardown {
        Teardown {
            provider: self.provider,
        }
    }
}

/// Flushes pending spans and releases exporter resources.
///
/// Consumed by [`run`](Self::run), so it executes at most once.
#[must_use = "dropping a Teardown without running it may lose buffered spans"]
pub struct Teardown {
    provider: TracerProvider,
}

impl Teardown {
    pub async fn run(self) {
        let provider = self.provider;
        // Provider shutdown blocks on the batch processor.
        match tokio::task::spawn_blocking(move || provider.shutdown()).await {
            Ok(Ok(())) => tracing::debug!("tracer provider shut down"),
            Ok(Err(err)) => tracing::warn!(error = %err, "tracer provider shutdown failed"),
            Err(err) => tracing::warn!(error = %err, "tracer provider shutdown task failed"),
        }
    }
}

/// Build the tracer provider for `config` and install it globally.
///
/// The SDK reports its own failures as `tracing` events; the subscriber from
/// [`init_subscriber`](crate::observability::logging::init_subscriber) forwards
/// them as error records tagged `tracer = "opentelemetry"`.
pub fn setup_tracing(config: &ServiceConfig) -> Result<TracerHandle, TracingError> {
    let sampler = Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
        config.otel_sample_rate,
    )));
    let resource = Resource::new([KeyValue::new("service.name", config.name.clone())]);

    let mut builder = TracerProvider::builder()
        .with_sampler(sampler)
        .with_resource(resource);

    if let Some(endpoint) = &config.otel_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.clone())
            .build()
            .map_err(|err| TracingError::Exporter {
                endpoint: endpoint.clone(),
                reason: err.to_string(),
            })?;
        builder = builder.with_batch_exporter(exporter, runtime::Tokio);
    }

    let provider = builder.build();
    let tracer = provider.tracer(config.name.clone());

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    tracing::debug!(
        service = %config.name,
        sample_rate = config.otel_sample_rate,
        endpoint = ?config.otel_endpoint,
        "Tracer provider installed"
    );

    Ok(TracerHandle { provider, tracer })
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Middleware opening a server span per request.
///
/// Records the response status, and marks the span as failed when the
/// response carries a [`HandlerError`] or a 5xx status.
pub async fn trace_requests(
    State(filter): State<TelemetryFilter>,
    request: Request,
    next: Next,
) -> Response {
    if filter.should_skip(request.uri().path()) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let route = matched_route(&request);
    let request_id = request.request_id().unwrap_or_default().to_owned();
    let parent = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });

    let span = tracing::info_span!(
        "http.request",
        otel.name = %format!("{method} {route}"),
        otel.kind = "server",
        otel.status_code = field::Empty,
        http.request.method = %method,
        http.route = %route,
        http.response.status_code = field::Empty,
        request_id = %request_id,
    );
    span.set_parent(parent);

    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status();
    span.record("http.response.status_code", status.as_u16());
    if let Some(error) = response.extensions().get::<HandlerError>() {
        span.record("otel.status_code", "ERROR");
        tracing::error!(parent: &span, error = %error, "handler error");
    } else if status.is_server_error() {
        span.record("otel.status_code", "ERROR");
    }

    response
}
