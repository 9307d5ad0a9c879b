//! OpenTelemetry SDK diagnostics.
//!
//! # Responsibilities
//! - Recognize the SDK's internal events (export failures, dropped spans)
//! - Render them as error records tagged `tracer = "opentelemetry"`
//!
//! # Design Decisions
//! - The SDK reports through `tracing` under its crate-name targets, so the
//!   adapter is a log layer rather than a global callback
//! - SDK events leave the message empty and put the description in the event
//!   name; the name becomes the message

use std::fmt;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Target prefix shared by the `opentelemetry*` crates.
pub const SDK_TARGET_PREFIX: &str = "opentelemetry";

/// Value of the `tracer` field on forwarded diagnostics.
pub const TRACER_FIELD_VALUE: &str = "opentelemetry";

/// Whether an event or span originates inside the OpenTelemetry crates.
pub fn is_sdk_diagnostic(metadata: &Metadata<'_>) -> bool {
    metadata.target().starts_with(SDK_TARGET_PREFIX)
}

/// JSON event format for SDK diagnostics.
///
/// Output matches the shape of the service's JSON records, with the level
/// raised to `ERROR` and the SDK's own level kept as `sdk_level`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticFormat;

impl<S, N> FormatEvent<S, N> for DiagnosticFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut timestamp = String::new();
        SystemTime.format_time(&mut Writer::new(&mut timestamp))?;

        let metadata = event.metadata();
        let mut fields = FieldMap::default();
        event.record(&mut fields);
        let mut fields = fields.0;

        let message = match fields.remove("message") {
            Some(Value::String(message)) if !message.is_empty() => message,
            _ => metadata.name().to_owned(),
        };
        fields.insert("message".into(), Value::String(message));
        fields.insert("tracer".into(), Value::from(TRACER_FIELD_VALUE));
        fields.insert("sdk_level".into(), Value::from(metadata.level().to_string()));

        let record = serde_json::json!({
            "timestamp": timestamp,
            "level": "ERROR",
            "fields": fields,
            "target": metadata.target(),
        });
        writeln!(writer, "{record}")
    }
}

#[derive(Default)]
struct FieldMap(Map<String, Value>);

impl Visit for FieldMap {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().into(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().into(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().into(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().into(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().into(), Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture::TelemetryCapture;

    #[test]
    fn test_sdk_targets_recognized() {
        let capture = TelemetryCapture::default();
        tracing::subscriber::with_default(capture.subscriber(), || {
            tracing::info!(target: "opentelemetry_sdk", "sdk");
            tracing::info!(target: "opentelemetry-otlp", "otlp");
            tracing::info!(target: "service_kit::http", "service");
        });

        let tagged: Vec<_> = capture
            .records()
            .into_iter()
            .filter(|r| r["fields"]["tracer"] == TRACER_FIELD_VALUE)
            .map(|r| r["target"].as_str().unwrap_or_default().to_owned())
            .collect();
        assert_eq!(tagged, vec!["opentelemetry_sdk", "opentelemetry-otlp"]);
    }

    #[test]
    fn test_sdk_event_forwarded_as_error() {
        let capture = TelemetryCapture::default();
        tracing::subscriber::with_default(capture.subscriber(), || {
            tracing::warn!(
                name: "BatchSpanProcessor.ExportError",
                target: "opentelemetry_sdk",
                error = "connection refused",
                ""
            );
        });

        let records = capture.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["level"], "ERROR");
        assert_eq!(record["target"], "opentelemetry_sdk");
        assert_eq!(record["fields"]["tracer"], "opentelemetry");
        assert_eq!(record["fields"]["message"], "BatchSpanProcessor.ExportError");
        assert_eq!(record["fields"]["error"], "connection refused");
        assert_eq!(record["fields"]["sdk_level"], "WARN");
    }

    #[test]
    fn test_service_records_untouched() {
        let capture = TelemetryCapture::default();
        tracing::subscriber::with_default(capture.subscriber(), || {
            tracing::warn!(status = 404_u64, "Request rejected");
        });

        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "WARN");
        assert_eq!(records[0]["fields"]["message"], "Request rejected");
        assert!(records[0]["fields"].get("tracer").is_none());
    }
}
