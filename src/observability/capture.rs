//! In-memory telemetry capture for tests.
//!
//! Renders log records through [`log_layers`] into a buffer and keeps a
//! record of every span with its fields and the events emitted inside it.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

use crate::observability::logging::log_layers;

/// A span seen by the capture, with its final field values.
#[derive(Debug, Clone)]
pub(crate) struct CapturedSpan {
    id: u64,
    pub name: &'static str,
    pub fields: Map<String, Value>,
    pub events: Vec<Map<String, Value>>,
}

#[derive(Clone, Default)]
pub(crate) struct TelemetryCapture {
    lines: Arc<Mutex<Vec<u8>>>,
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

impl TelemetryCapture {
    /// Subscriber writing the service's JSON records into this capture.
    pub(crate) fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        tracing_subscriber::registry()
            .with(log_layers(self.clone()))
            .with(SpanRecorder(self.spans.clone()))
    }

    /// Parsed JSON log records, in emission order.
    pub(crate) fn records(&self) -> Vec<Value> {
        let lines = self.lines.lock().unwrap();
        String::from_utf8_lossy(&lines)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Captured spans named `name`.
    pub(crate) fn spans(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|span| span.name == name)
            .cloned()
            .collect()
    }
}

impl io::Write for TelemetryCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lines.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for TelemetryCapture {
    type Writer = TelemetryCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct SpanRecorder(Arc<Mutex<Vec<CapturedSpan>>>);

impl SpanRecorder {
    fn with_span(&self, id: &Id, f: impl FnOnce(&mut CapturedSpan)) {
        let mut spans = self.0.lock().unwrap();
        if let Some(span) = spans.iter_mut().rev().find(|s| s.id == id.into_u64()) {
            f(span);
        }
    }
}

impl<S> Layer<S> for SpanRecorder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        attrs.record(&mut fields);
        self.0.lock().unwrap().push(CapturedSpan {
            id: id.into_u64(),
            name: attrs.metadata().name(),
            fields: fields.0,
            events: Vec::new(),
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        values.record(&mut fields);
        self.with_span(id, |span| span.fields.extend(fields.0));
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(parent) = ctx.event_span(event) else {
            return;
        };
        let mut fields = FieldMap::default();
        event.record(&mut fields);
        fields
            .0
            .insert("level".into(), Value::from(event.metadata().level().to_string()));
        self.with_span(&parent.id(), |span| span.events.push(fields.0));
    }
}

#[derive(Default)]
struct FieldMap(Map<String, Value>);

impl Visit for FieldMap {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().into(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().into(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().into(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().into(), Value::from(format!("{value:?}")));
    }
}
