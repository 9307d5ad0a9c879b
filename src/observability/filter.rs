//! Telemetry suppression for probe endpoints.
//!
//! # Design Decisions
//! - Prefix match, not exact match: `/health/live` is suppressed along with `/health`
//! - Pure and lock-free; shared by every request task

use std::sync::Arc;

/// Returns false iff `path` starts with `health_path` or `metrics_path`.
pub fn should_record(path: &str, health_path: &str, metrics_path: &str) -> bool {
    !(path.starts_with(health_path) || path.starts_with(metrics_path))
}

/// Decides which requests are logged and traced.
#[derive(Debug, Clone)]
pub struct TelemetryFilter {
    health_path: Arc<str>,
    metrics_path: Arc<str>,
}

impl TelemetryFilter {
    pub fn new(health_path: &str, metrics_path: &str) -> Self {
        Self {
            health_path: health_path.into(),
            metrics_path: metrics_path.into(),
        }
    }

    /// Whether a request for `path` should produce a log record and a span.
    pub fn should_record(&self, path: &str) -> bool {
        should_record(path, &self.health_path, &self.metrics_path)
    }

    /// Inverse of [`should_record`](Self::should_record), used by the span middleware.
    pub fn should_skip(&self, path: &str) -> bool {
        !self.should_record(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_paths_suppressed() {
        let filter = TelemetryFilter::new("/health", "/metrics");
        assert!(!filter.should_record("/health"));
        assert!(!filter.should_record("/metrics"));
        assert!(filter.should_skip("/metrics"));
    }

    #[test]
    fn test_prefix_semantics() {
        assert!(!should_record("/health/live", "/health", "/metrics"));
        assert!(!should_record("/healthz", "/health", "/metrics"));
        assert!(!should_record("/metrics/extra", "/health", "/metrics"));
        assert!(should_record("/api/health", "/health", "/metrics"));
        assert!(should_record("/", "/health", "/metrics"));
        assert!(should_record("/orders/42", "/health", "/metrics"));
    }

    #[test]
    fn test_custom_paths() {
        let filter = TelemetryFilter::new("/livez", "/prom");
        assert!(filter.should_record("/health"));
        assert!(!filter.should_record("/livez/ready"));
        assert!(!filter.should_record("/prom"));
    }
}
