//! Service configuration definitions.
//!
//! A [`ServiceConfig`] is assembled once through [`ServiceConfigBuilder`]
//! (directly, from an ordered list of [`ServiceOption`]s, or from a config
//! file) and is immutable afterwards.

use std::time::Duration;

use serde::Deserialize;

/// Default path of the liveness endpoint.
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Default path of the metrics exposition endpoint.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default fraction of requests sampled for tracing.
pub const DEFAULT_SAMPLE_RATE: f64 = 0.2;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default graceful-shutdown deadline.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Frozen configuration of one service instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Service identity reported to logs and traces.
    pub name: String,

    /// OTLP collector endpoint. No exporter is attached when absent.
    pub otel_endpoint: Option<String>,

    /// Trace sample rate in (0, 1].
    pub otel_sample_rate: f64,

    /// Path prefix of the health endpoint.
    pub health_path: String,

    /// Path prefix of the metrics endpoint.
    pub metrics_path: String,

    /// Listen address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on graceful shutdown.
    pub shutdown_timeout: Duration,
}

impl ServiceConfig {
    /// Start building a configuration for the named service.
    pub fn builder(name: impl Into<String>) -> ServiceConfigBuilder {
        ServiceConfigBuilder::new(name)
    }

    /// Build a configuration by applying `options` left to right.
    ///
    /// Later options override earlier ones touching the same field. Fields
    /// left unset fall back to their defaults.
    pub fn new(name: impl Into<String>, options: impl IntoIterator<Item = ServiceOption>) -> Self {
        options
            .into_iter()
            .fold(ServiceConfigBuilder::new(name), ServiceConfigBuilder::apply)
            .build()
    }
}

/// A single named configuration mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOption {
    HealthPath(String),
    MetricsPath(String),
    SampleRate(f64),
    OtelEndpoint(String),
    BindAddress(String),
    ShutdownTimeout(Duration),
}

/// Accumulates optional settings before defaults are filled in.
///
/// Every field is explicitly optional so "unset" is never confused with a
/// zero value supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfigBuilder {
    name: String,
    #[serde(default)]
    health_path: Option<String>,
    #[serde(default)]
    metrics_path: Option<String>,
    #[serde(default, rename = "otel_sample_rate")]
    sample_rate: Option<f64>,
    #[serde(default)]
    otel_endpoint: Option<String>,
    #[serde(default)]
    bind_address: Option<String>,
    #[serde(default, rename = "shutdown_timeout_secs", deserialize_with = "secs_to_duration")]
    shutdown_timeout: Option<Duration>,
}

impl ServiceConfigBuilder {
    /// Create a builder seeded with the service name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = Some(path.into());
        self
    }

    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    pub fn sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    pub fn otel_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otel_endpoint = Some(endpoint.into());
        self
    }

    pub fn bind_address(mut self, address: impl Into<String>) -> Self {
        self.bind_address = Some(address.into());
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Apply one option. Used to fold an ordered option list.
    pub fn apply(self, option: ServiceOption) -> Self {
        match option {
            ServiceOption::HealthPath(path) => self.health_path(path),
            ServiceOption::MetricsPath(path) => self.metrics_path(path),
            ServiceOption::SampleRate(rate) => self.sample_rate(rate),
            ServiceOption::OtelEndpoint(endpoint) => self.otel_endpoint(endpoint),
            ServiceOption::BindAddress(address) => self.bind_address(address),
            ServiceOption::ShutdownTimeout(timeout) => self.shutdown_timeout(timeout),
        }
    }

    /// Freeze the configuration, replacing unset fields with defaults.
    ///
    /// Empty strings count as unset. A sample rate that is not a finite
    /// positive number counts as unset; rates above 1 are clamped to 1.
    pub fn build(self) -> ServiceConfig {
        let otel_sample_rate = match self.sample_rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => rate.min(1.0),
            _ => DEFAULT_SAMPLE_RATE,
        };

        ServiceConfig {
            name: self.name,
            otel_endpoint: self.otel_endpoint.filter(|e| !e.is_empty()),
            otel_sample_rate,
            health_path: non_empty_or(self.health_path, DEFAULT_HEALTH_PATH),
            metrics_path: non_empty_or(self.metrics_path, DEFAULT_METRICS_PATH),
            bind_address: non_empty_or(self.bind_address, DEFAULT_BIND_ADDRESS),
            shutdown_timeout: self.shutdown_timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn secs_to_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
}
